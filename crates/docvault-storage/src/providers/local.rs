//! Local filesystem storage provider.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::traits::storage::{ByteStream, StorageObjectMeta, StorageProvider};

use crate::path;

/// Local filesystem storage provider.
#[derive(Debug, Clone)]
pub struct LocalStorageProvider {
    /// Root directory of the physical document tree.
    root: PathBuf,
}

impl LocalStorageProvider {
    /// Create a new local storage provider rooted at the given path.
    pub async fn new(root_path: impl AsRef<Path>) -> AppResult<Self> {
        let root = root_path.as_ref().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::io(
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// The physical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::io(
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    fn describe(path: &str, meta: &std::fs::Metadata, is_symlink: bool) -> StorageObjectMeta {
        StorageObjectMeta {
            path: path.to_string(),
            name: path::file_name(path).to_string(),
            size_bytes: meta.len(),
            last_modified: meta.modified().ok().and_then(truncate_to_millis),
            is_directory: meta.is_dir(),
            is_symlink,
        }
    }
}

/// Convert a filesystem timestamp to UTC with millisecond precision.
///
/// The catalog compares stored `last_modified` values with disk times, so
/// both sides must carry the same precision.
pub fn truncate_to_millis(time: SystemTime) -> Option<DateTime<Utc>> {
    let millis = DateTime::<Utc>::from(time).timestamp_millis();
    DateTime::<Utc>::from_timestamp_millis(millis)
}

#[async_trait]
impl StorageProvider for LocalStorageProvider {
    fn provider_type(&self) -> &str {
        "local"
    }

    fn physical_path(&self, path: &str) -> AppResult<PathBuf> {
        path::to_physical(&self.root, path)
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        let full_path = self.physical_path(path)?;
        let file = fs::File::open(&full_path)
            .await
            .map_err(|e| AppError::io(format!("Failed to open file: {path}"), e))?;

        Ok(Box::pin(ReaderStream::new(file)))
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        let full_path = self.physical_path(path)?;
        let data = fs::read(&full_path)
            .await
            .map_err(|e| AppError::io(format!("Failed to read file: {path}"), e))?;
        Ok(Bytes::from(data))
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        let full_path = self.physical_path(path)?;
        self.ensure_parent(&full_path).await?;

        fs::write(&full_path, &data)
            .await
            .map_err(|e| AppError::io(format!("Failed to write file: {path}"), e))?;

        debug!(path, bytes = data.len(), "Wrote file");
        Ok(())
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let full_path = self.physical_path(path)?;
        fs::remove_file(&full_path)
            .await
            .map_err(|e| AppError::io(format!("Failed to delete file: {path}"), e))
    }

    async fn delete_dir(&self, path: &str) -> AppResult<()> {
        let full_path = self.physical_path(path)?;
        fs::remove_dir_all(&full_path)
            .await
            .map_err(|e| AppError::io(format!("Failed to delete directory: {path}"), e))
    }

    async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
        let from_path = self.physical_path(from)?;
        let to_path = self.physical_path(to)?;
        self.ensure_parent(&to_path).await?;

        fs::copy(&from_path, &to_path)
            .await
            .map_err(|e| AppError::io(format!("Failed to copy {from} -> {to}"), e))?;
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> AppResult<()> {
        let from_path = self.physical_path(from)?;
        let to_path = self.physical_path(to)?;
        self.ensure_parent(&to_path).await?;

        fs::rename(&from_path, &to_path)
            .await
            .map_err(|e| AppError::io(format!("Failed to rename {from} -> {to}"), e))
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        let full_path = self.physical_path(path)?;
        fs::try_exists(&full_path)
            .await
            .map_err(|e| AppError::io(format!("Failed to check {path}"), e))
    }

    async fn metadata(&self, path: &str) -> AppResult<StorageObjectMeta> {
        let full_path = self.physical_path(path)?;
        let link_meta = fs::symlink_metadata(&full_path)
            .await
            .map_err(|e| AppError::io(format!("Path not found: {path}"), e))?;
        Ok(Self::describe(path, &link_meta, link_meta.file_type().is_symlink()))
    }

    async fn list(&self, path: &str) -> AppResult<Vec<StorageObjectMeta>> {
        let full_path = self.physical_path(path)?;
        let mut dir = fs::read_dir(&full_path)
            .await
            .map_err(|e| AppError::io(format!("Failed to list directory: {path}"), e))?;

        let mut entries = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| AppError::io(format!("Failed to read entry in: {path}"), e))?
        {
            let entry_path = match path::to_virtual(&self.root, &entry.path()) {
                Ok(p) => p,
                Err(e) => {
                    warn!(directory = %path, error = %e, "Skipping unmappable entry");
                    continue;
                }
            };
            // DirEntry::metadata does not traverse symlinks.
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                Err(e) => {
                    warn!(path = %entry_path, error = %e, "Skipping entry that cannot be inspected");
                    continue;
                }
            };
            entries.push(Self::describe(
                &entry_path,
                &meta,
                meta.file_type().is_symlink(),
            ));
        }

        entries.sort_by(|a, b| {
            b.is_directory
                .cmp(&a.is_directory)
                .then(a.path.cmp(&b.path))
        });

        Ok(entries)
    }

    async fn create_dir(&self, path: &str) -> AppResult<()> {
        let full_path = self.physical_path(path)?;
        fs::create_dir_all(&full_path)
            .await
            .map_err(|e| AppError::io(format!("Failed to create directory: {path}"), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_core::error::ErrorKind;

    async fn provider() -> (tempfile::TempDir, LocalStorageProvider) {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalStorageProvider::new(dir.path()).await.unwrap();
        (dir, provider)
    }

    #[tokio::test]
    async fn test_write_read_delete() {
        let (_dir, provider) = provider().await;

        let data = Bytes::from("hello world");
        provider.write("test/file.txt", data.clone()).await.unwrap();
        assert!(provider.exists("test/file.txt").await.unwrap());

        let read_back = provider.read_bytes("test/file.txt").await.unwrap();
        assert_eq!(read_back, data);

        provider.delete("test/file.txt").await.unwrap();
        assert!(!provider.exists("test/file.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let (_dir, provider) = provider().await;
        let err = provider.read("nope.txt").await.err().unwrap();
        assert_eq!(err.kind, ErrorKind::NotFound);
        let err = provider.delete("nope.txt").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_list_puts_directories_first() {
        let (_dir, provider) = provider().await;
        provider.write("listdir/b.txt", Bytes::from("b")).await.unwrap();
        provider.write("listdir/a.txt", Bytes::from("a")).await.unwrap();
        provider.create_dir("listdir/sub").await.unwrap();

        let entries = provider.list("listdir").await.unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["listdir/sub", "listdir/a.txt", "listdir/b.txt"]);
        assert_eq!(entries[1].name, "a.txt");
        assert_eq!(entries[1].size_bytes, 1);
    }

    #[tokio::test]
    async fn test_rename_creates_destination_parent() {
        let (_dir, provider) = provider().await;
        provider.write("a/doc.txt", Bytes::from("x")).await.unwrap();
        provider.rename("a", "deep/b").await.unwrap();
        assert!(provider.exists("deep/b/doc.txt").await.unwrap());
        assert!(!provider.exists("a").await.unwrap());
    }

    #[tokio::test]
    async fn test_metadata_truncates_to_millis() {
        let (_dir, provider) = provider().await;
        provider.write("f.txt", Bytes::from("x")).await.unwrap();
        let meta = provider.metadata("f.txt").await.unwrap();
        let modified = meta.last_modified.unwrap();
        assert_eq!(modified.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[tokio::test]
    async fn test_parent_escape_is_rejected() {
        let (_dir, provider) = provider().await;
        let err = provider.read_bytes("../etc/passwd").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_reported_not_followed() {
        let (dir, provider) = provider().await;
        provider.create_dir("real").await.unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();

        let entries = provider.list("").await.unwrap();
        let link = entries.iter().find(|e| e.name == "link").unwrap();
        assert!(link.is_symlink);
        assert!(!link.is_directory);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_skips_entries_it_cannot_inspect() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, provider) = provider().await;
        provider.write("locked/a.txt", Bytes::from("a")).await.unwrap();
        // Readable but not searchable: names come back, stat on them fails.
        let locked = dir.path().join("locked");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o444)).unwrap();

        let listed = provider.list("locked").await;
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Privileged users can still stat the entry; everyone else gets it
        // dropped rather than a failed listing.
        let entries = listed.unwrap();
        assert!(entries.iter().all(|e| e.path == "locked/a.txt"));
    }
}
