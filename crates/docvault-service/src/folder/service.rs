//! Explicit folder creation.

use std::sync::Arc;

use tracing::{info, warn};

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::traits::storage::StorageProvider;
use docvault_core::types::DocumentId;
use docvault_database::repositories::{DocumentRepository, HistoryRepository};
use docvault_entity::document::{DocumentEntity, NewDocument, SOURCE_LOCAL};
use docvault_entity::history::HistoryAction;
use docvault_storage::path;

use crate::rewrite::NameAllocator;

/// Creates folders on disk and in the catalog.
#[derive(Debug, Clone)]
pub struct FolderService {
    /// Document repository.
    documents: Arc<DocumentRepository>,
    /// Physical tree.
    storage: Arc<dyn StorageProvider>,
    /// Path availability checks.
    names: NameAllocator,
}

impl FolderService {
    /// Creates a new folder service.
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

    /// Create folder `name` under `parent_path`.
    ///
    /// The directory is created first; if the catalog insert then fails it
    /// is removed again. An existing row or directory at the path is a
    /// conflict.
    pub async fn create_folder(&self, name: &str, parent_path: &str) -> AppResult<DocumentEntity> {
        path::validate_name(name)?;
        let parent = path::normalize(parent_path)?;
        self.names.ensure_live_parent(&parent).await?;
        let folder_path = path::join(&parent, name);

        if !self.names.is_free(&folder_path).await? {
            return Err(AppError::conflict(format!(
                "Path '{folder_path}' is already taken"
            )));
        }

        self.storage.create_dir(&folder_path).await?;

        let new = NewDocument::folder(
            DocumentId::generate_folder(),
            name,
            &folder_path,
            name,
            SOURCE_LOCAL,
        );
        match self.record(&new).await {
            Ok(doc) => {
                info!(document_id = %doc.id, path = %doc.path, "Folder created");
                Ok(doc)
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.delete_dir(&folder_path).await {
                    warn!(path = %folder_path, error = %cleanup, "Failed to remove orphaned folder");
                }
                Err(e)
            }
        }
    }

    async fn record(&self, new: &NewDocument) -> AppResult<DocumentEntity> {
        let mut tx = self.documents.begin().await?;
        let created = DocumentRepository::create_in(&mut tx, new).await?;
        HistoryRepository::append_in(&mut tx, &created.id, HistoryAction::Create, "Folder created")
            .await?;
        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit folder creation", e)
        })?;
        Ok(created)
    }
}
