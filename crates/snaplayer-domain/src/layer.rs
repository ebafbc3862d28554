use serde::{Deserialize, Serialize};

use crate::Hash;

/// Media type of a gzip-compressed tar layer.
pub const DOCKER_LAYER_GZIP: &str = "application/vnd.docker.image.rootfs.diff.tar.gzip";

/// Serializable summary of a materialized layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerInfo {
    pub diff_id: Hash,
    pub digest: Hash,
    pub size: u64,
    pub media_type: String,
}
