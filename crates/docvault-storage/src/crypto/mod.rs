//! At-rest encryption container.
//!
//! Layout on disk: `IV (16) || tag (16) || ciphertext`, produced by
//! AES-256-GCM with a 16-byte nonce and no associated data. The container
//! is internal; the catalog's `encrypted` flag is the only external marker.

pub mod container;
pub mod stream;

use thiserror::Error;

use docvault_core::error::{AppError, ErrorKind};

pub use container::ContainerCipher;
pub use stream::DecryptStream;

/// Length of the random IV at the start of a container.
pub const IV_LEN: usize = 16;

/// Length of the authentication tag following the IV.
pub const TAG_LEN: usize = 16;

/// Bytes preceding the ciphertext.
pub const HEADER_LEN: usize = IV_LEN + TAG_LEN;

/// Errors produced by the container codec.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The container is shorter than its fixed header.
    #[error("container truncated: expected at least {HEADER_LEN} bytes, observed {observed}")]
    Truncated {
        /// Bytes available before the source ended.
        observed: usize,
    },
    /// The authentication tag does not match the ciphertext.
    #[error("authentication tag mismatch")]
    TagMismatch,
    /// Encryption failed.
    #[error("encryption failure")]
    Encrypt,
    /// The source failed while reading the header.
    #[error("failed to read container: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CryptoError> for AppError {
    fn from(err: CryptoError) -> Self {
        let kind = match &err {
            CryptoError::Io(_) => ErrorKind::Filesystem,
            CryptoError::Encrypt => ErrorKind::Internal,
            CryptoError::Truncated { .. } | CryptoError::TagMismatch => ErrorKind::Decryption,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}
