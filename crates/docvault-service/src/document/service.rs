//! The operation surface exposed to the outer layers.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use docvault_core::config::AppConfig;
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::traits::storage::StorageProvider;
use docvault_core::types::{BulkOutcome, DocumentId};
use docvault_database::repositories::{DocumentRepository, HistoryRepository};
use docvault_entity::document::DocumentEntity;
use docvault_entity::history::{HistoryAction, HistoryEntry};
use docvault_entity::listing::FolderItem;
use docvault_storage::crypto::ContainerCipher;
use docvault_storage::path;

use crate::content::{ContentService, ContentStream, UploadRequest};
use crate::copy::CopyService;
use crate::folder::{FolderService, resolve_children};
use crate::rewrite::{NameAllocator, PathRewriteService, Relocation};
use crate::scan::{ScanReport, ScanService};
use crate::share::LinkService;
use crate::trash::TrashService;

/// Facade over the catalog services.
///
/// Every operation maps onto one component: scanning, path rewrites,
/// copies, trash, content, listings, tags, sharing, and history.
#[derive(Debug, Clone)]
pub struct DocumentService {
    documents: Arc<DocumentRepository>,
    history: Arc<HistoryRepository>,
    scanner: ScanService,
    rewrite: PathRewriteService,
    copier: CopyService,
    trash: TrashService,
    content: ContentService,
    folders: FolderService,
    links: LinkService,
}

impl DocumentService {
    /// Wire the services from repositories, a storage provider, and config.
    ///
    /// Fails if the configured encryption key is unusable.
    pub fn new(
        documents: Arc<DocumentRepository>,
        history: Arc<HistoryRepository>,
        storage: Arc<dyn StorageProvider>,
        config: &AppConfig,
    ) -> AppResult<Self> {
        let cipher = ContainerCipher::new(config.crypto.key_bytes()?);
        let names = NameAllocator::new(Arc::clone(&documents), Arc::clone(&storage));
        let default_category = config.scanner.default_category.clone();

        Ok(Self {
            scanner: ScanService::new(
                Arc::clone(&documents),
                Arc::clone(&history),
                Arc::clone(&storage),
                config.scanner.clone(),
            ),
            rewrite: PathRewriteService::new(
                Arc::clone(&documents),
                Arc::clone(&storage),
                names.clone(),
            ),
            copier: CopyService::new(
                Arc::clone(&documents),
                Arc::clone(&storage),
                names.clone(),
                default_category.clone(),
            ),
            trash: TrashService::new(Arc::clone(&documents), Arc::clone(&storage)),
            content: ContentService::new(
                Arc::clone(&documents),
                Arc::clone(&history),
                Arc::clone(&storage),
                cipher,
                config.crypto.encrypt_uploads,
                config.storage.max_upload_size_bytes,
                default_category,
            ),
            folders: FolderService::new(Arc::clone(&documents), storage, names),
            links: LinkService::new(),
            documents,
            history,
        })
    }

    // ── Scan ────────────────────────────────────────────────────

    /// Reconcile the catalog with the physical tree below `root`.
    pub async fn scan(&self, root: &str, category: Option<&str>) -> AppResult<ScanReport> {
        self.scanner.scan(root, category).await
    }

    // ── Reads ───────────────────────────────────────────────────

    /// Load one document.
    pub async fn get(&self, id: &DocumentId) -> AppResult<DocumentEntity> {
        self.documents.get(id).await
    }

    /// All active documents.
    pub async fn list_active(&self) -> AppResult<Vec<DocumentEntity>> {
        self.documents.list_active().await
    }

    /// Everything in the trash, at any depth.
    pub async fn list_trashed(&self) -> AppResult<Vec<DocumentEntity>> {
        self.documents.list_trashed().await
    }

    /// Direct children of `current_path`, with inferred folders.
    pub async fn list_folder(&self, current_path: &str) -> AppResult<Vec<FolderItem>> {
        let current = path::normalize(current_path)?;
        let active = self.documents.list_active().await?;
        Ok(resolve_children(&active, &current, Utc::now()))
    }

    /// History of a document, newest first.
    pub async fn history(&self, id: &DocumentId) -> AppResult<Vec<HistoryEntry>> {
        self.documents.get(id).await?;
        self.history.find_by_document(id).await
    }

    // ── Structure ───────────────────────────────────────────────

    /// Create folder `name` under `parent_path`.
    pub async fn create_folder(&self, name: &str, parent_path: &str) -> AppResult<DocumentEntity> {
        self.folders.create_folder(name, parent_path).await
    }

    /// Rename a document in place.
    pub async fn rename(&self, id: &DocumentId, new_name: &str) -> AppResult<Relocation> {
        self.rewrite.rename(id, new_name).await
    }

    /// Move documents into `target`.
    pub async fn move_documents(&self, ids: &[DocumentId], target: &str) -> BulkOutcome {
        self.rewrite.move_many(ids, target).await
    }

    /// Copy files into `target`.
    pub async fn copy_documents(&self, ids: &[DocumentId], target: &str) -> AppResult<BulkOutcome> {
        self.copier.copy(ids, target).await
    }

    // ── Trash ───────────────────────────────────────────────────

    /// Move a document (and its subtree) to the trash.
    pub async fn soft_delete(&self, id: &DocumentId) -> AppResult<u64> {
        self.trash.soft_delete(id).await
    }

    /// Move several documents to the trash.
    pub async fn bulk_soft_delete(&self, ids: &[DocumentId]) -> BulkOutcome {
        self.trash.bulk_soft_delete(ids).await
    }

    /// Restore a trashed document (and its subtree).
    pub async fn restore(&self, id: &DocumentId) -> AppResult<u64> {
        self.trash.restore(id).await
    }

    /// Remove a document from disk and catalog for good.
    pub async fn permanent_delete(&self, id: &DocumentId) -> AppResult<u64> {
        self.trash.permanent_delete(id).await
    }

    /// Purge everything in the trash.
    pub async fn empty_trash(&self) -> AppResult<BulkOutcome> {
        self.trash.empty_trash().await
    }

    // ── Content ─────────────────────────────────────────────────

    /// Open a file's plaintext content.
    pub async fn read_content(&self, id: &DocumentId) -> AppResult<ContentStream> {
        self.content.read_content(id).await
    }

    /// Store an uploaded file.
    pub async fn write_upload(&self, request: UploadRequest) -> AppResult<DocumentEntity> {
        self.content.write_upload(request).await
    }

    // ── Metadata ────────────────────────────────────────────────

    /// Replace a document's tags. Blank tags are dropped, surrounding
    /// whitespace is trimmed, and duplicates keep their first position.
    pub async fn update_tags(&self, id: &DocumentId, tags: &[String]) -> AppResult<DocumentEntity> {
        let doc = self.active(id).await?;
        let cleaned = clean_tags(tags);

        let updated = self.documents.set_tags(&doc.id, &cleaned).await?;
        self.history
            .append(
                &doc.id,
                HistoryAction::Update,
                &format!("Tags set to [{}]", cleaned.join(", ")),
            )
            .await?;
        Ok(updated)
    }

    /// Publish a document and return its share token.
    ///
    /// Sharing an already shared document returns the existing token.
    pub async fn share(&self, id: &DocumentId) -> AppResult<String> {
        let doc = self.active(id).await?;
        if let Some(token) = doc.share_token.as_ref().filter(|_| doc.is_shared) {
            return Ok(token.clone());
        }

        let token = self.links.generate_token();
        self.documents.set_share_token(&doc.id, Some(&token)).await?;
        self.history
            .append(&doc.id, HistoryAction::Update, "Share link created")
            .await?;
        info!(document_id = %doc.id, "Document shared");
        Ok(token)
    }

    /// Revoke a document's share token.
    pub async fn unshare(&self, id: &DocumentId) -> AppResult<DocumentEntity> {
        let doc = self.documents.get(id).await?;
        if !doc.is_shared {
            return Ok(doc);
        }
        let updated = self.documents.set_share_token(&doc.id, None).await?;
        self.history
            .append(&doc.id, HistoryAction::Update, "Share link revoked")
            .await?;
        info!(document_id = %doc.id, "Document unshared");
        Ok(updated)
    }

    /// Resolve a public share token.
    pub async fn find_by_share_token(&self, token: &str) -> AppResult<DocumentEntity> {
        self.documents
            .find_by_share_token(token)
            .await?
            .ok_or_else(|| AppError::not_found("Share link not found"))
    }

    async fn active(&self, id: &DocumentId) -> AppResult<DocumentEntity> {
        let doc = self.documents.get(id).await?;
        if doc.deleted {
            return Err(AppError::validation(format!(
                "Document {id} is in the trash"
            )));
        }
        Ok(doc)
    }
}

fn clean_tags(tags: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !cleaned.iter().any(|t| t == tag) {
            cleaned.push(tag.to_string());
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let raw: Vec<String> = ["  tax ", "", "2024", "tax", "   "]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(clean_tags(&raw), ["tax", "2024"]);
    }
}
