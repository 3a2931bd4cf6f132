//! Rename and move.
//!
//! The physical rename always happens first. Only when it succeeds is the
//! catalog rewritten, inside one transaction that relocates the entity and,
//! for folders, every descendant with a single set-based update. If the
//! catalog step fails twice the physical rename is reversed.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::traits::storage::StorageProvider;
use docvault_core::types::{BulkOutcome, DocumentId};
use docvault_database::repositories::{DocumentRepository, HistoryRepository};
use docvault_entity::document::DocumentEntity;
use docvault_entity::history::HistoryAction;
use docvault_storage::path;

use super::naming::NameAllocator;

/// Label used when a move has to rename to avoid a collision.
const MOVED_LABEL: &str = "Moved";

/// Where an entity ended up after a rename or move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relocation {
    /// The relocated entity.
    pub id: DocumentId,
    /// Path before the operation.
    pub old_path: String,
    /// Path after the operation.
    pub new_path: String,
}

impl Relocation {
    fn unchanged(doc: &DocumentEntity) -> Self {
        Self {
            id: doc.id.clone(),
            old_path: doc.path.clone(),
            new_path: doc.path.clone(),
        }
    }

    /// Whether the operation was a no-op.
    pub fn is_noop(&self) -> bool {
        self.old_path == self.new_path
    }
}

/// Executes rename and move as physical rename plus catalog transaction.
#[derive(Debug, Clone)]
pub struct PathRewriteService {
    /// Document repository.
    documents: Arc<DocumentRepository>,
    /// Physical tree.
    storage: Arc<dyn StorageProvider>,
    /// Destination name picker.
    names: NameAllocator,
}

impl PathRewriteService {
    /// Creates a new path rewrite service.
    pub fn new(
        documents: Arc<DocumentRepository>,
        storage: Arc<dyn StorageProvider>,
        names: NameAllocator,
    ) -> Self {
        Self {
            documents,
            storage,
            names,
        }
    }

    /// Rename an entity in place. A taken name is a conflict.
    pub async fn rename(&self, id: &DocumentId, new_name: &str) -> AppResult<Relocation> {
        path::validate_name(new_name)?;
        let doc = self.load_active(id).await?;

        if doc.name == new_name {
            return Ok(Relocation::unchanged(&doc));
        }

        let new_path = path::join(doc.parent_path(), new_name);
        if !self.names.is_free(&new_path).await? {
            return Err(AppError::conflict(format!(
                "Path '{new_path}' is already taken"
            )));
        }

        self.relocate(&doc, new_name, &new_path, HistoryAction::Rename)
            .await
    }

    /// Move one entity into `target` (a virtual directory path).
    ///
    /// The destination directory is created when missing. A name collision
    /// at the destination is resolved with a `(Moved N)` suffix.
    pub async fn move_to(&self, id: &DocumentId, target: &str) -> AppResult<Relocation> {
        let target = path::normalize(target)?;
        let doc = self.load_active(id).await?;

        if doc.parent_path() == target {
            return Ok(Relocation::unchanged(&doc));
        }
        if doc.is_folder() && path::is_within(&doc.path, &target) {
            return Err(AppError::validation(format!(
                "Cannot move '{}' into itself",
                doc.path
            )));
        }
        self.names.ensure_live_parent(&target).await?;

        let created = self.first_missing_dir(&target).await?;
        if created.is_some() {
            self.storage.create_dir(&target).await?;
        }

        let result = match self
            .names
            .allocate(&target, &doc.name, MOVED_LABEL, doc.is_folder())
            .await
        {
            Ok(name) => {
                let new_path = path::join(&target, &name);
                self.relocate(&doc, &name, &new_path, HistoryAction::Move)
                    .await
            }
            Err(e) => Err(e),
        };

        if let (Err(_), Some(dir)) = (&result, &created) {
            if let Err(cleanup) = self.storage.delete_dir(dir).await {
                warn!(path = %dir, error = %cleanup, "Failed to remove move target");
            }
        }
        result
    }

    /// The shallowest directory on the way to `target` that does not exist yet.
    async fn first_missing_dir(&self, target: &str) -> AppResult<Option<String>> {
        let mut prefix = String::new();
        for part in target.split('/').filter(|p| !p.is_empty()) {
            prefix = path::join(&prefix, part);
            if !self.storage.exists(&prefix).await? {
                return Ok(Some(prefix));
            }
        }
        Ok(None)
    }

    /// Move several entities into `target`, one at a time.
    pub async fn move_many(&self, ids: &[DocumentId], target: &str) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for id in ids {
            match self.move_to(id, target).await {
                Ok(_) => outcome.record_success(),
                Err(e) => {
                    warn!(document_id = %id, target = %target, error = %e, "Move failed");
                    outcome.record_failure(id.clone(), &e);
                }
            }
        }
        outcome
    }

    async fn load_active(&self, id: &DocumentId) -> AppResult<DocumentEntity> {
        let doc = self.documents.get(id).await?;
        if doc.deleted {
            return Err(AppError::validation(format!(
                "Document {id} is in the trash"
            )));
        }
        Ok(doc)
    }

    async fn relocate(
        &self,
        doc: &DocumentEntity,
        new_name: &str,
        new_path: &str,
        action: HistoryAction,
    ) -> AppResult<Relocation> {
        self.storage.rename(&doc.path, new_path).await?;

        let first = match self.commit(doc, new_name, new_path, action).await {
            Ok(relocation) => return Ok(relocation),
            Err(e) => e,
        };
        warn!(
            document_id = %doc.id,
            from = %doc.path,
            to = %new_path,
            error = %first,
            "Catalog rewrite failed, retrying"
        );

        let second = match self.commit(doc, new_name, new_path, action).await {
            Ok(relocation) => return Ok(relocation),
            Err(e) => e,
        };

        match self.storage.rename(new_path, &doc.path).await {
            Ok(()) => warn!(
                document_id = %doc.id,
                path = %doc.path,
                "Reverted physical rename after catalog failure"
            ),
            Err(revert) => error!(
                document_id = %doc.id,
                catalog_path = %doc.path,
                disk_path = %new_path,
                error = %revert,
                "Catalog and disk diverged; the next scan will reconcile"
            ),
        }

        Err(AppError::with_source(
            ErrorKind::Database,
            format!("Failed to record {action} of '{}'", doc.path),
            second,
        ))
    }

    async fn commit(
        &self,
        doc: &DocumentEntity,
        new_name: &str,
        new_path: &str,
        action: HistoryAction,
    ) -> AppResult<Relocation> {
        let now = Utc::now();
        let mut tx = self.documents.begin().await?;

        DocumentRepository::relocate_in(&mut tx, &doc.id, new_name, new_path, now).await?;

        let mut descendants = 0;
        if doc.is_folder() {
            descendants =
                DocumentRepository::rewrite_descendant_paths_in(&mut tx, &doc.path, new_path)
                    .await?;
            if doc.name != new_name {
                DocumentRepository::rewrite_subtree_category_in(
                    &mut tx, new_path, &doc.name, new_name,
                )
                .await?;
            }
        }

        let details = format!("{} -> {}", doc.path, new_path);
        HistoryRepository::append_in(&mut tx, &doc.id, action, &details).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit path rewrite", e)
        })?;

        info!(
            document_id = %doc.id,
            from = %doc.path,
            to = %new_path,
            descendants,
            action = %action,
            "Document relocated"
        );

        Ok(Relocation {
            id: doc.id.clone(),
            old_path: doc.path.clone(),
            new_path: new_path.to_string(),
        })
    }
}
