//! Trash lifecycle: soft delete, restore, permanent delete, empty trash.

use std::sync::Arc;

use tracing::{debug, info, warn};

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::traits::storage::StorageProvider;
use docvault_core::types::{BulkOutcome, DocumentId};
use docvault_database::repositories::{DocumentRepository, HistoryRepository};
use docvault_entity::document::DocumentEntity;
use docvault_entity::history::HistoryAction;
use docvault_storage::path;

/// Moves entities between active, trashed, and purged.
///
/// Soft delete and restore only flip the `deleted` flag; the bytes stay on
/// disk. Folder operations cover the whole subtree in one transaction.
#[derive(Debug, Clone)]
pub struct TrashService {
    /// Document repository.
    documents: Arc<DocumentRepository>,
    /// Physical tree.
    storage: Arc<dyn StorageProvider>,
}

impl TrashService {
    /// Creates a new trash service.
    pub fn new(documents: Arc<DocumentRepository>, storage: Arc<dyn StorageProvider>) -> Self {
        Self { documents, storage }
    }

    /// Move an entity (and for folders its subtree) to the trash.
    ///
    /// Returns the number of rows flipped.
    pub async fn soft_delete(&self, id: &DocumentId) -> AppResult<u64> {
        let doc = self.documents.get(id).await?;
        if doc.deleted {
            return Err(AppError::validation(format!(
                "Document {id} is already in the trash"
            )));
        }

        let flipped = self
            .flip(&doc, true, HistoryAction::Delete, "Moved to trash")
            .await?;
        info!(document_id = %id, path = %doc.path, rows = flipped, "Moved to trash");
        Ok(flipped)
    }

    /// Soft-delete several entities; one failure does not stop the rest.
    pub async fn bulk_soft_delete(&self, ids: &[DocumentId]) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for id in ids {
            match self.soft_delete(id).await {
                Ok(_) => outcome.record_success(),
                Err(e) => {
                    warn!(document_id = %id, error = %e, "Soft delete failed");
                    outcome.record_failure(id.clone(), &e);
                }
            }
        }
        outcome
    }

    /// Bring a trashed entity (and for folders its subtree) back.
    ///
    /// Fails with `Conflict` if another active row now holds the path, or
    /// if a folder above it is still in the trash.
    pub async fn restore(&self, id: &DocumentId) -> AppResult<u64> {
        let doc = self.documents.get(id).await?;
        if !doc.deleted {
            return Err(AppError::validation(format!(
                "Document {id} is not in the trash"
            )));
        }
        if let Some(ancestor) = self
            .documents
            .find_trashed_on_path(path::parent(&doc.path))
            .await?
        {
            return Err(AppError::conflict(format!(
                "Folder '{}' is in the trash; restore it first",
                ancestor.path
            )));
        }
        if let Some(occupant) = self.documents.find_by_path(&doc.path).await? {
            if occupant.id != doc.id && !occupant.deleted {
                return Err(AppError::conflict(format!(
                    "Path '{}' is occupied by another document",
                    doc.path
                )));
            }
        }

        let restored = self
            .flip(&doc, false, HistoryAction::Restore, "Restored from trash")
            .await?;
        info!(document_id = %id, path = %doc.path, rows = restored, "Restored from trash");
        Ok(restored)
    }

    /// Remove an entity from disk and catalog, history included.
    ///
    /// Physical removal failures are logged and tolerated; the catalog is
    /// cleaned up regardless. Returns the number of rows removed.
    pub async fn permanent_delete(&self, id: &DocumentId) -> AppResult<u64> {
        let doc = self.documents.get(id).await?;
        self.purge(&doc).await
    }

    /// Permanently delete everything in the trash.
    ///
    /// Each trashed subtree root is purged with its full subtree. A failure
    /// on one item is recorded and the rest are still processed.
    pub async fn empty_trash(&self) -> AppResult<BulkOutcome> {
        let trashed = self.documents.list_trashed().await?;
        let roots = subtree_roots(&trashed);

        let mut outcome = BulkOutcome::default();
        for doc in roots {
            match self.purge(doc).await {
                Ok(_) => outcome.record_success(),
                Err(e) => {
                    warn!(document_id = %doc.id, path = %doc.path, error = %e, "Purge failed");
                    outcome.record_failure(doc.id.clone(), &e);
                }
            }
        }

        info!(
            purged = outcome.succeeded,
            failed = outcome.failed.len(),
            "Trash emptied"
        );
        Ok(outcome)
    }

    async fn flip(
        &self,
        doc: &DocumentEntity,
        deleted: bool,
        action: HistoryAction,
        details: &str,
    ) -> AppResult<u64> {
        let mut tx = self.documents.begin().await?;
        let rows = if doc.is_folder() {
            DocumentRepository::set_deleted_subtree_in(&mut tx, &doc.path, deleted).await?
        } else {
            DocumentRepository::set_deleted_in(&mut tx, &doc.id, deleted).await?
        };
        HistoryRepository::append_in(&mut tx, &doc.id, action, details).await?;
        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit trash change", e)
        })?;
        Ok(rows)
    }

    async fn purge(&self, doc: &DocumentEntity) -> AppResult<u64> {
        // A trashed folder may hold rows that were restored or placed there
        // afterwards; only its trashed part goes.
        let trashed_only = doc.is_folder() && doc.deleted;
        if trashed_only && !self.documents.list_active_under(&doc.path).await?.is_empty() {
            self.remove_trashed_bytes(doc).await?;
        } else {
            let removal = if doc.is_folder() {
                self.storage.delete_dir(&doc.path).await
            } else {
                self.storage.delete(&doc.path).await
            };
            log_removal(&doc.path, removal);
        }

        let mut tx = self.documents.begin().await?;
        let (history, rows) = if trashed_only {
            let history =
                HistoryRepository::delete_for_trashed_subtree_in(&mut tx, &doc.path).await?;
            let rows = DocumentRepository::delete_trashed_subtree_in(&mut tx, &doc.path).await?;
            (history, rows)
        } else if doc.is_folder() {
            let history = HistoryRepository::delete_for_subtree_in(&mut tx, &doc.path).await?;
            let rows = DocumentRepository::delete_subtree_in(&mut tx, &doc.path).await?;
            (history, rows)
        } else {
            let history = HistoryRepository::delete_for_document_in(&mut tx, &doc.id).await?;
            let rows = DocumentRepository::delete_in(&mut tx, &doc.id).await?;
            (history, rows)
        };
        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit purge", e)
        })?;

        info!(
            document_id = %doc.id,
            path = %doc.path,
            rows,
            history,
            "Permanently deleted"
        );
        Ok(rows)
    }

    /// Remove the bytes of the trashed rows under `root` one by one.
    ///
    /// Files go first, then trashed folders deepest first, and only when
    /// nothing is left inside them.
    async fn remove_trashed_bytes(&self, root: &DocumentEntity) -> AppResult<()> {
        let trashed = self.documents.list_trashed_under(&root.path).await?;
        let (folders, files): (Vec<_>, Vec<_>) = trashed.iter().partition(|d| d.is_folder());

        for file in files {
            log_removal(&file.path, self.storage.delete(&file.path).await);
        }
        for folder in folders.iter().rev() {
            match self.storage.list(&folder.path).await {
                Ok(entries) if entries.is_empty() => {
                    log_removal(&folder.path, self.storage.delete_dir(&folder.path).await)
                }
                Ok(_) => debug!(path = %folder.path, "Keeping non-empty trashed folder on disk"),
                Err(e) if e.is(ErrorKind::NotFound) => {
                    debug!(path = %folder.path, "Already gone from disk")
                }
                Err(e) => warn!(path = %folder.path, error = %e, "Could not inspect trashed folder"),
            }
        }
        Ok(())
    }
}

/// Physical removal failures are tolerated; the catalog is purged anyway.
fn log_removal(path: &str, removal: AppResult<()>) {
    match removal {
        Ok(()) => debug!(path = %path, "Removed from disk"),
        Err(e) if e.is(ErrorKind::NotFound) => debug!(path = %path, "Already gone from disk"),
        Err(e) => warn!(path = %path, error = %e, "Physical removal failed, purging catalog anyway"),
    }
}

/// Trashed rows not covered by a trashed folder earlier in the list.
fn subtree_roots(trashed: &[DocumentEntity]) -> Vec<&DocumentEntity> {
    let mut roots: Vec<&DocumentEntity> = Vec::new();
    for doc in trashed {
        let covered = roots
            .iter()
            .any(|root| root.is_folder() && root.is_ancestor_of(&doc.path));
        if !covered {
            roots.push(doc);
        }
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use docvault_entity::document::{DocumentStatus, DocumentType, SOURCE_LOCAL};
    use sqlx::types::Json;

    fn row(path: &str, doc_type: DocumentType) -> DocumentEntity {
        DocumentEntity {
            id: DocumentId::generate(),
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            category: "General".into(),
            path: path.into(),
            doc_type,
            cloud_source: SOURCE_LOCAL.into(),
            status: DocumentStatus::Valid,
            encrypted: false,
            file_size: None,
            tags: Json(Vec::new()),
            uploaded_at: Utc::now(),
            last_modified: Utc::now(),
            deleted: true,
            is_shared: false,
            share_token: None,
        }
    }

    #[test]
    fn roots_skip_rows_inside_trashed_folders() {
        let rows = vec![
            row("A", DocumentType::Folder),
            row("A b.txt", DocumentType::File),
            row("A/x.txt", DocumentType::File),
            row("A/y/z.txt", DocumentType::File),
            row("B.txt", DocumentType::File),
        ];
        let roots: Vec<&str> = subtree_roots(&rows).iter().map(|d| d.path.as_str()).collect();
        assert_eq!(roots, ["A", "A b.txt", "B.txt"]);
    }

    #[test]
    fn file_rows_never_cover_others() {
        let rows = vec![
            row("A", DocumentType::File),
            row("A/x.txt", DocumentType::File),
        ];
        assert_eq!(subtree_roots(&rows).len(), 2);
    }
}
