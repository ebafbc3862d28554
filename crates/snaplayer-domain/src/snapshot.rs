use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::FileRecord;

/// Metadata for every node under a root at one point in time.
///
/// Records are keyed and iterated by path, which is what gives layers built
/// from the same snapshot identical bytes. A snapshot is never mutated after
/// construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    creation_time: OffsetDateTime,
    files: BTreeMap<String, FileRecord>,
}

impl Snapshot {
    /// Snapshot of the tree rooted at `name`.
    pub fn new(name: impl Into<String>, records: impl IntoIterator<Item = FileRecord>) -> Self {
        Self::build(Some(name.into()), records)
    }

    /// Snapshot computed from other snapshots; it has no root name.
    pub fn derived(records: impl IntoIterator<Item = FileRecord>) -> Self {
        Self::build(None, records)
    }

    fn build(name: Option<String>, records: impl IntoIterator<Item = FileRecord>) -> Self {
        let files = records
            .into_iter()
            .map(|record| (record.path.clone(), record))
            .collect();
        Self {
            name,
            creation_time: OffsetDateTime::now_utc(),
            files,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn creation_time(&self) -> OffsetDateTime {
        self.creation_time
    }

    pub fn files(&self) -> &BTreeMap<String, FileRecord> {
        &self.files
    }

    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.files.get(path)
    }

    /// Records in path order.
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.values()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Sum of regular-file sizes, i.e. the payload a layer will carry.
    pub fn content_bytes(&self) -> u64 {
        self.records().map(|record| record.size).sum()
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).context("failed to encode snapshot")
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let snapshot: Self = serde_json::from_slice(bytes).context("failed to decode snapshot")?;
        for (key, record) in &snapshot.files {
            if key != &record.path {
                anyhow::bail!("snapshot key {key} does not match record path {}", record.path);
            }
            record.validate()?;
        }
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_json()?;
        fs::write(path, bytes)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read snapshot from {}", path.display()))?;
        Self::from_json(&bytes).with_context(|| format!("invalid snapshot {}", path.display()))
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stamp = self
            .creation_time
            .format(format_description!(
                "[hour]:[minute]:[second].[subsecond digits:3]"
            ))
            .map_err(|_| fmt::Error)?;
        write!(f, "{}@{stamp}", self.name.as_deref().unwrap_or("(diff)"))
    }
}
