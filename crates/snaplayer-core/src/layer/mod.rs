//! Layer blobs built from snapshots.
//!
//! - `tar.rs`: hashing writer and tar entry helpers
//! - `materialize.rs`: the two-stage tar then gzip pipeline
//! - `tests.rs`: module tests

mod materialize;
mod tar;

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use snaplayer_domain::{Hash, LayerInfo};

pub use materialize::materialize;

/// Read access to a finished layer, as consumed by image composition.
pub trait Layer {
    /// Hash of the compressed stream.
    fn digest(&self) -> &Hash;

    /// Hash of the uncompressed tar stream.
    fn diff_id(&self) -> &Hash;

    /// Fresh reader over the gzip bytes.
    fn compressed(&self) -> io::Result<Box<dyn Read + Send>>;

    /// Fresh reader over the tar bytes.
    fn uncompressed(&self) -> io::Result<Box<dyn Read + Send>>;

    /// Length of the compressed stream in bytes.
    fn size(&self) -> u64;

    fn media_type(&self) -> &str;

    fn info(&self) -> LayerInfo {
        LayerInfo {
            diff_id: self.diff_id().clone(),
            digest: self.digest().clone(),
            size: self.size(),
            media_type: self.media_type().to_string(),
        }
    }
}

/// A layer materialized on disk from a [`crate::Snapshot`].
///
/// Both artifacts belong to the layer; nothing about it changes after
/// [`materialize`] returns.
#[derive(Clone, Debug)]
pub struct SnapshotLayer {
    tar_path: PathBuf,
    compressed_path: PathBuf,
    diff_id: Hash,
    digest: Hash,
    compressed_size: u64,
    media_type: &'static str,
}

impl SnapshotLayer {
    #[must_use]
    pub fn tar_path(&self) -> &Path {
        &self.tar_path
    }

    #[must_use]
    pub fn compressed_path(&self) -> &Path {
        &self.compressed_path
    }
}

impl Layer for SnapshotLayer {
    fn digest(&self) -> &Hash {
        &self.digest
    }

    fn diff_id(&self) -> &Hash {
        &self.diff_id
    }

    fn compressed(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(&self.compressed_path)?))
    }

    fn uncompressed(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(&self.tar_path)?))
    }

    fn size(&self) -> u64 {
        self.compressed_size
    }

    fn media_type(&self) -> &str {
        self.media_type
    }
}
