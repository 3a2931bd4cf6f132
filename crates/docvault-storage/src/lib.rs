//! # docvault-storage
//!
//! Everything that touches bytes on disk: the virtual path codec, the
//! at-rest encryption container with streaming decryption, the content-type
//! table, and the local filesystem provider.

pub mod crypto;
pub mod mime;
pub mod path;
pub mod providers;

pub use crypto::{ContainerCipher, CryptoError};
pub use providers::LocalStorageProvider;
