//! Storage provider trait for the physical document tree.

use std::path::PathBuf;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;

use crate::result::AppResult;

/// Metadata about a stored object.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StorageObjectMeta {
    /// Virtual path within the provider root.
    pub path: String,
    /// Leaf name.
    pub name: String,
    /// Size in bytes as stored (container length for encrypted files).
    pub size_bytes: u64,
    /// Last modified timestamp, truncated to milliseconds.
    pub last_modified: Option<DateTime<Utc>>,
    /// Whether this is a directory.
    pub is_directory: bool,
    /// Whether this entry is a symbolic link (never followed).
    pub is_symlink: bool,
}

/// A byte stream type used for reading file contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Trait for the backend holding the physical document tree.
///
/// All paths are virtual paths (forward-slash separated, relative to the
/// provider root). The local implementation lives in `docvault-storage`.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local").
    fn provider_type(&self) -> &str;

    /// Absolute location of a virtual path.
    fn physical_path(&self, path: &str) -> AppResult<PathBuf>;

    /// Read a file and return its byte stream.
    async fn read(&self, path: &str) -> AppResult<ByteStream>;

    /// Read a file into memory as a complete byte vector.
    async fn read_bytes(&self, path: &str) -> AppResult<Bytes>;

    /// Write bytes to a file at the given path, creating parents.
    async fn write(&self, path: &str, data: Bytes) -> AppResult<()>;

    /// Delete a file at the given path.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// Delete a directory and all its contents recursively.
    async fn delete_dir(&self, path: &str) -> AppResult<()>;

    /// Copy a file from one path to another within this provider.
    async fn copy(&self, from: &str, to: &str) -> AppResult<()>;

    /// Move (rename) a file or directory within this provider.
    async fn rename(&self, from: &str, to: &str) -> AppResult<()>;

    /// Check whether a file or directory exists at the given path.
    async fn exists(&self, path: &str) -> AppResult<bool>;

    /// Get metadata about a file or directory.
    async fn metadata(&self, path: &str) -> AppResult<StorageObjectMeta>;

    /// List the direct contents of a directory.
    async fn list(&self, path: &str) -> AppResult<Vec<StorageObjectMeta>>;

    /// Create a directory (and any missing parents).
    async fn create_dir(&self, path: &str) -> AppResult<()>;
}
