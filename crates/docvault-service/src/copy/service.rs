//! Copy engine.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::traits::storage::StorageProvider;
use docvault_core::types::{BulkOutcome, DocumentId};
use docvault_database::repositories::{DocumentRepository, HistoryRepository};
use docvault_entity::document::{DocumentEntity, NewDocument};
use docvault_entity::history::HistoryAction;
use docvault_storage::path;

use crate::rewrite::NameAllocator;

/// Label used when a copy has to rename to avoid a collision.
const COPY_LABEL: &str = "Copy";

/// What happened to one copy source.
enum CopyResult {
    Copied(DocumentEntity),
    Skipped,
}

/// Duplicates files physically and inserts fresh catalog rows for them.
///
/// Folders are not copied recursively; they are reported as skipped.
#[derive(Debug, Clone)]
pub struct CopyService {
    /// Document repository.
    documents: Arc<DocumentRepository>,
    /// Physical tree.
    storage: Arc<dyn StorageProvider>,
    /// Destination name picker.
    names: NameAllocator,
    /// Category for copies landing at the storage root.
    default_category: String,
}

impl CopyService {
    /// Creates a new copy service.
    pub fn new(
        documents: Arc<DocumentRepository>,
        storage: Arc<dyn StorageProvider>,
        names: NameAllocator,
        default_category: impl Into<String>,
    ) -> Self {
        Self {
            documents,
            storage,
            names,
            default_category: default_category.into(),
        }
    }

    /// Copy each file in `ids` into `target`.
    ///
    /// An invalid target fails the whole call. Per-item failures are
    /// collected in the outcome; sources that are folders or no longer
    /// exist on disk are skipped.
    pub async fn copy(&self, ids: &[DocumentId], target: &str) -> AppResult<BulkOutcome> {
        let target = path::normalize(target)?;
        self.names.ensure_live_parent(&target).await?;
        if !target.is_empty() {
            self.storage.create_dir(&target).await?;
        }

        let mut outcome = BulkOutcome::default();
        for id in ids {
            match self.copy_one(id, &target).await {
                Ok(CopyResult::Copied(doc)) => {
                    debug!(source_id = %id, document_id = %doc.id, path = %doc.path, "Copied");
                    outcome.record_success();
                }
                Ok(CopyResult::Skipped) => outcome.record_skip(id.clone()),
                Err(e) => {
                    warn!(document_id = %id, target = %target, error = %e, "Copy failed");
                    outcome.record_failure(id.clone(), &e);
                }
            }
        }

        info!(
            target = %target,
            copied = outcome.succeeded,
            skipped = outcome.skipped.len(),
            failed = outcome.failed.len(),
            "Copy finished"
        );
        Ok(outcome)
    }

    async fn copy_one(&self, id: &DocumentId, target: &str) -> AppResult<CopyResult> {
        let source = self.documents.get(id).await?;
        if source.deleted {
            return Err(AppError::validation(format!(
                "Document {id} is in the trash"
            )));
        }
        if source.is_folder() {
            debug!(document_id = %id, "Folders are not copied");
            return Ok(CopyResult::Skipped);
        }
        if !self.storage.exists(&source.path).await? {
            debug!(document_id = %id, path = %source.path, "Copy source missing on disk");
            return Ok(CopyResult::Skipped);
        }

        let name = self
            .names
            .allocate(target, &source.name, COPY_LABEL, false)
            .await?;
        let dest = path::join(target, &name);

        self.storage.copy(&source.path, &dest).await?;

        match self.record(&source, &name, &dest, target).await {
            Ok(doc) => Ok(CopyResult::Copied(doc)),
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&dest).await {
                    warn!(path = %dest, error = %cleanup, "Failed to remove orphaned copy");
                }
                Err(e)
            }
        }
    }

    async fn record(
        &self,
        source: &DocumentEntity,
        name: &str,
        dest: &str,
        target: &str,
    ) -> AppResult<DocumentEntity> {
        let now = Utc::now();
        let modified = self
            .storage
            .metadata(dest)
            .await?
            .last_modified
            .unwrap_or(now);

        let category = if target.is_empty() {
            self.default_category.clone()
        } else {
            path::file_name(target).to_string()
        };

        let new = NewDocument {
            id: DocumentId::generate(),
            name: name.to_string(),
            category,
            path: dest.to_string(),
            doc_type: source.doc_type,
            cloud_source: source.cloud_source.clone(),
            status: source.status,
            encrypted: source.encrypted,
            file_size: source.file_size,
            tags: source.tag_list().to_vec(),
            uploaded_at: now,
            last_modified: modified,
        };

        let mut tx = self.documents.begin().await?;
        let created = DocumentRepository::create_in(&mut tx, &new).await?;
        HistoryRepository::append_in(
            &mut tx,
            &created.id,
            HistoryAction::Copy,
            &format!("Copied from {}", source.path),
        )
        .await?;
        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit copy", e)
        })?;

        Ok(created)
    }
}
