//! At-rest encryption configuration.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Key material and policy for the encrypted object store.
#[derive(Clone, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// Base64-encoded 256-bit key.
    pub key: String,
    /// Whether uploads are written as encrypted containers.
    #[serde(default = "default_true")]
    pub encrypt_uploads: bool,
}

impl CryptoConfig {
    /// Decode the configured key into raw bytes.
    pub fn key_bytes(&self) -> Result<[u8; 32], AppError> {
        let raw = STANDARD
            .decode(self.key.trim())
            .map_err(|e| AppError::configuration(format!("crypto.key is not valid base64: {e}")))?;
        raw.try_into().map_err(|raw: Vec<u8>| {
            AppError::configuration(format!(
                "crypto.key must decode to 32 bytes, got {}",
                raw.len()
            ))
        })
    }
}

impl std::fmt::Debug for CryptoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoConfig")
            .field("key", &"****")
            .field("encrypt_uploads", &self.encrypt_uploads)
            .finish()
    }
}

fn default_true() -> bool {
    true
}
