//! Physical document tree configuration.

use serde::{Deserialize, Serialize};

/// Where the mirrored directory tree lives and how large uploads may be.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the physical document tree. Virtual paths are relative to it.
    pub root_path: String,
    /// Maximum upload size in bytes (default 512 MB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
}

fn default_max_upload() -> u64 {
    536_870_912 // 512 MB
}
