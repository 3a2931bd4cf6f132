//! Collision-free destination names.

use std::sync::Arc;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::traits::storage::StorageProvider;
use docvault_database::repositories::DocumentRepository;
use docvault_storage::path;

/// Highest suffix tried before a collision is reported as unresolved.
const MAX_SUFFIX: u32 = 9_999;

/// Picks destination names that collide with neither the catalog nor disk.
///
/// Trashed rows still own their bytes on disk, so their paths count as
/// taken.
#[derive(Debug, Clone)]
pub struct NameAllocator {
    documents: Arc<DocumentRepository>,
    storage: Arc<dyn StorageProvider>,
}

impl NameAllocator {
    /// Creates a new name allocator.
    pub fn new(documents: Arc<DocumentRepository>, storage: Arc<dyn StorageProvider>) -> Self {
        Self { documents, storage }
    }

    /// Whether `path` is unused in the catalog and on disk.
    pub async fn is_free(&self, path: &str) -> AppResult<bool> {
        if self.documents.path_taken(path).await? {
            return Ok(false);
        }
        Ok(!self.storage.exists(path).await?)
    }

    /// Fails with `Validation` if `parent` or a folder above it is trashed.
    ///
    /// Rows placed there would disappear when the trash is emptied.
    pub async fn ensure_live_parent(&self, parent: &str) -> AppResult<()> {
        ensure_live_parent(&self.documents, parent).await
    }

    /// Return `name` if it is free under `parent`, otherwise the first free
    /// `name (<label> N)` for N = 1, 2, ...
    pub async fn allocate(
        &self,
        parent: &str,
        name: &str,
        label: &str,
        is_folder: bool,
    ) -> AppResult<String> {
        if self.is_free(&path::join(parent, name)).await? {
            return Ok(name.to_string());
        }
        for n in 1..=MAX_SUFFIX {
            let candidate = path::with_suffix(name, label, n, is_folder);
            if self.is_free(&path::join(parent, &candidate)).await? {
                return Ok(candidate);
            }
        }
        Err(AppError::conflict(format!(
            "No free name for '{name}' in '{parent}'"
        )))
    }
}

/// Reject `parent` when it sits at or below a trashed row.
pub async fn ensure_live_parent(documents: &DocumentRepository, parent: &str) -> AppResult<()> {
    match documents.find_trashed_on_path(parent).await? {
        Some(trashed) => Err(AppError::validation(format!(
            "Destination '{parent}' is inside trashed '{}'",
            trashed.path
        ))),
        None => Ok(()),
    }
}
