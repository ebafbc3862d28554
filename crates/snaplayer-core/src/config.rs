use std::collections::BTreeMap;
use std::env;

use crate::Error;

const GZIP_LEVEL_VAR: &str = "SNAPLAYER_GZIP_LEVEL";
const COMPRESSED_SUFFIX_VAR: &str = "SNAPLAYER_COMPRESSED_SUFFIX";

const DEFAULT_GZIP_LEVEL: u32 = 2;
const DEFAULT_COMPRESSED_SUFFIX: &str = ".gz";

const VAR_PREFIX: &str = "SNAPLAYER_";

/// The `SNAPLAYER_*` variables visible when the process started.
#[derive(Debug, Clone, Default)]
pub(crate) struct EnvSnapshot {
    snaplayer_vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self::from_pairs(env::vars().filter(|(key, _)| key.starts_with(VAR_PREFIX)))
    }

    pub(crate) fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            snaplayer_vars: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Value of `key`, treating an empty assignment as unset.
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.snaplayer_vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    materialize: MaterializeOptions,
}

impl Config {
    /// Builds a configuration from the current process environment.
    ///
    /// # Errors
    /// Returns [`Error::Config`] when a `SNAPLAYER_*` variable holds an
    /// unusable value.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot) -> Result<Self, Error> {
        let mut materialize = MaterializeOptions::default();
        if let Some(raw) = snapshot.get(GZIP_LEVEL_VAR) {
            let level = raw.trim().parse::<u32>().map_err(|_| Error::Config {
                key: GZIP_LEVEL_VAR,
                value: raw.to_string(),
                reason: "expected an integer between 0 and 9",
            })?;
            materialize = materialize.with_compression_level(level)?;
        }
        if let Some(raw) = snapshot.get(COMPRESSED_SUFFIX_VAR) {
            materialize = materialize.with_compressed_suffix(raw)?;
        }
        Ok(Self { materialize })
    }

    #[must_use]
    pub fn materialize(&self) -> &MaterializeOptions {
        &self.materialize
    }

    #[must_use]
    pub fn into_materialize(self) -> MaterializeOptions {
        self.materialize
    }
}

/// Knobs for [`crate::materialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeOptions {
    compression_level: u32,
    compressed_suffix: String,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_GZIP_LEVEL,
            compressed_suffix: DEFAULT_COMPRESSED_SUFFIX.to_string(),
        }
    }
}

impl MaterializeOptions {
    /// # Errors
    /// Rejects levels above 9.
    pub fn with_compression_level(mut self, level: u32) -> Result<Self, Error> {
        if level > 9 {
            return Err(Error::Config {
                key: GZIP_LEVEL_VAR,
                value: level.to_string(),
                reason: "expected an integer between 0 and 9",
            });
        }
        self.compression_level = level;
        Ok(self)
    }

    /// # Errors
    /// Rejects empty suffixes and suffixes containing a path separator.
    pub fn with_compressed_suffix(mut self, suffix: &str) -> Result<Self, Error> {
        if suffix.is_empty() || suffix.contains(['/', '\\']) {
            return Err(Error::Config {
                key: COMPRESSED_SUFFIX_VAR,
                value: suffix.to_string(),
                reason: "expected a non-empty file name suffix",
            });
        }
        self.compressed_suffix = suffix.to_string();
        Ok(self)
    }

    #[must_use]
    pub fn compression_level(&self) -> u32 {
        self.compression_level
    }

    #[must_use]
    pub fn compressed_suffix(&self) -> &str {
        &self.compressed_suffix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_fast_gzip_and_gz_suffix() {
        let config = Config::from_snapshot(&EnvSnapshot::default()).expect("config");
        assert_eq!(config.materialize().compression_level(), 2);
        assert_eq!(config.materialize().compressed_suffix(), ".gz");
    }

    #[test]
    fn reads_overrides_from_environment() {
        let snapshot = EnvSnapshot::from_pairs([
            ("SNAPLAYER_GZIP_LEVEL", " 9 "),
            ("SNAPLAYER_COMPRESSED_SUFFIX", ".tgz"),
        ]);
        let options = Config::from_snapshot(&snapshot)
            .expect("config")
            .into_materialize();
        assert_eq!(options.compression_level(), 9);
        assert_eq!(options.compressed_suffix(), ".tgz");
    }

    #[test]
    fn rejects_out_of_range_level() {
        let snapshot = EnvSnapshot::from_pairs([("SNAPLAYER_GZIP_LEVEL", "12")]);
        let err = Config::from_snapshot(&snapshot).expect_err("level 12");
        assert_eq!(err.code(), "SL301");

        let snapshot = EnvSnapshot::from_pairs([("SNAPLAYER_GZIP_LEVEL", "fast")]);
        assert!(Config::from_snapshot(&snapshot).is_err());
    }

    #[test]
    fn rejects_suffix_with_separator() {
        let snapshot = EnvSnapshot::from_pairs([("SNAPLAYER_COMPRESSED_SUFFIX", "/gz")]);
        assert!(Config::from_snapshot(&snapshot).is_err());
    }

    #[test]
    fn empty_assignment_keeps_default() {
        let snapshot = EnvSnapshot::from_pairs([
            ("SNAPLAYER_GZIP_LEVEL", ""),
            ("SNAPLAYER_COMPRESSED_SUFFIX", ""),
            ("UNRELATED", "1"),
        ]);
        let options = Config::from_snapshot(&snapshot)
            .expect("config")
            .into_materialize();
        assert_eq!(options.compression_level(), 2);
        assert_eq!(options.compressed_suffix(), ".gz");
    }
}
