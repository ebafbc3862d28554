#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod hash;
pub mod layer;
pub mod record;
pub mod snapshot;

pub use hash::{Hash, SHA256};
pub use layer::{LayerInfo, DOCKER_LAYER_GZIP};
pub use record::{FileKind, FileRecord};
pub use snapshot::Snapshot;
