#![deny(clippy::all, warnings)]

mod config;
mod diff;
mod error;
mod layer;
mod walk;

pub use snaplayer_domain::{
    FileKind, FileRecord, Hash, LayerInfo, Snapshot, DOCKER_LAYER_GZIP, SHA256,
};

pub use crate::config::{Config, MaterializeOptions};
pub use crate::diff::diff;
pub use crate::error::Error;
pub use crate::layer::{materialize, Layer, SnapshotLayer};
pub use crate::walk::walk;
