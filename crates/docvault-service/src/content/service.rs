//! Encrypted object store: upload writes and content reads.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::traits::storage::{ByteStream, StorageProvider};
use docvault_core::types::DocumentId;
use docvault_database::repositories::{DocumentRepository, HistoryRepository};
use docvault_entity::document::{
    DocumentEntity, DocumentStatus, DocumentType, NewDocument, SOURCE_UPLOAD,
};
use docvault_entity::history::HistoryAction;
use docvault_storage::crypto::ContainerCipher;
use docvault_storage::{mime, path};

use crate::rewrite::naming::ensure_live_parent;

/// A file handed in through the upload path.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Virtual directory to place the file in (`""` for the root).
    pub parent_path: String,
    /// Leaf name.
    pub name: String,
    /// Category override. Defaults to the parent directory's name.
    pub category: Option<String>,
    /// Raw plaintext bytes.
    pub data: Bytes,
}

/// Plaintext content ready to be served.
pub struct ContentStream {
    /// Content type guessed from the extension.
    pub mime: &'static str,
    /// Plaintext length recorded in the catalog.
    pub size: Option<u64>,
    /// Plaintext bytes. For encrypted files a tag mismatch arrives as a
    /// final `InvalidData` error.
    pub stream: ByteStream,
}

impl std::fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStream")
            .field("mime", &self.mime)
            .field("size", &self.size)
            .finish()
    }
}

/// Writes uploads (optionally as encrypted containers) and serves content.
#[derive(Clone)]
pub struct ContentService {
    /// Document repository.
    documents: Arc<DocumentRepository>,
    /// History repository.
    history: Arc<HistoryRepository>,
    /// Physical tree.
    storage: Arc<dyn StorageProvider>,
    /// Container codec.
    cipher: ContainerCipher,
    /// Whether uploads are written encrypted.
    encrypt_uploads: bool,
    /// Upload size limit in bytes.
    max_upload_size: u64,
    /// Category for uploads at the storage root.
    default_category: String,
}

impl std::fmt::Debug for ContentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentService")
            .field("encrypt_uploads", &self.encrypt_uploads)
            .field("max_upload_size", &self.max_upload_size)
            .finish()
    }
}

impl ContentService {
    /// Creates a new content service.
    pub fn new(
        documents: Arc<DocumentRepository>,
        history: Arc<HistoryRepository>,
        storage: Arc<dyn StorageProvider>,
        cipher: ContainerCipher,
        encrypt_uploads: bool,
        max_upload_size: u64,
        default_category: impl Into<String>,
    ) -> Self {
        Self {
            documents,
            history,
            storage,
            cipher,
            encrypt_uploads,
            max_upload_size,
            default_category: default_category.into(),
        }
    }

    /// Store an uploaded file and insert its catalog row.
    ///
    /// The catalog records the plaintext size. If the catalog insert fails
    /// the written bytes are removed again.
    pub async fn write_upload(&self, request: UploadRequest) -> AppResult<DocumentEntity> {
        path::validate_name(&request.name)?;
        let parent = path::normalize(&request.parent_path)?;
        ensure_live_parent(&self.documents, &parent).await?;

        let plain_len = request.data.len() as u64;
        if plain_len > self.max_upload_size {
            return Err(AppError::validation(format!(
                "Upload of {plain_len} bytes exceeds the {} byte limit",
                self.max_upload_size
            )));
        }

        let dest = path::join(&parent, &request.name);
        if self.documents.path_taken(&dest).await? || self.storage.exists(&dest).await? {
            return Err(AppError::conflict(format!("Path '{dest}' is already taken")));
        }

        let payload = if self.encrypt_uploads {
            Bytes::from(self.cipher.encrypt(&request.data)?)
        } else {
            request.data.clone()
        };
        self.storage.write(&dest, payload).await?;

        let category = request.category.unwrap_or_else(|| {
            if parent.is_empty() {
                self.default_category.clone()
            } else {
                path::file_name(&parent).to_string()
            }
        });

        match self
            .record_upload(&request.name, &dest, category, plain_len)
            .await
        {
            Ok(doc) => {
                info!(
                    document_id = %doc.id,
                    path = %doc.path,
                    bytes = plain_len,
                    encrypted = doc.encrypted,
                    "Upload stored"
                );
                Ok(doc)
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&dest).await {
                    warn!(path = %dest, error = %cleanup, "Failed to remove orphaned upload");
                }
                Err(e)
            }
        }
    }

    async fn record_upload(
        &self,
        name: &str,
        dest: &str,
        category: String,
        plain_len: u64,
    ) -> AppResult<DocumentEntity> {
        let now = Utc::now();
        let modified = self
            .storage
            .metadata(dest)
            .await?
            .last_modified
            .unwrap_or(now);

        let new = NewDocument {
            id: DocumentId::generate(),
            name: name.to_string(),
            category,
            path: dest.to_string(),
            doc_type: DocumentType::File,
            cloud_source: SOURCE_UPLOAD.to_string(),
            status: DocumentStatus::for_size(plain_len),
            encrypted: self.encrypt_uploads,
            file_size: Some(plain_len as i64),
            tags: Vec::new(),
            uploaded_at: now,
            last_modified: modified,
        };

        let mut tx = self.documents.begin().await?;
        let created = DocumentRepository::create_in(&mut tx, &new).await?;
        HistoryRepository::append_in(&mut tx, &created.id, HistoryAction::Create, "Uploaded")
            .await?;
        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit upload", e)
        })?;
        Ok(created)
    }

    /// Open a file's plaintext content.
    ///
    /// A row whose bytes are gone is flipped to `missing` before the
    /// `NotFound` is returned.
    pub async fn read_content(&self, id: &DocumentId) -> AppResult<ContentStream> {
        let doc = self.documents.get(id).await?;
        if doc.deleted {
            return Err(AppError::not_found(format!("Document {id} is in the trash")));
        }
        if doc.is_folder() {
            return Err(AppError::validation(format!(
                "Document {id} is a folder and has no content"
            )));
        }

        let raw = match self.storage.read(&doc.path).await {
            Ok(raw) => raw,
            Err(e) if e.is(ErrorKind::NotFound) => {
                self.flag_missing(&doc).await;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let stream: ByteStream = if doc.encrypted {
            Box::pin(self.cipher.open_stream(raw).await?)
        } else {
            raw
        };

        Ok(ContentStream {
            mime: mime::mime_from_path(&doc.name),
            size: doc.file_size.map(|s| s as u64),
            stream,
        })
    }

    async fn flag_missing(&self, doc: &DocumentEntity) {
        if doc.status == DocumentStatus::Missing {
            return;
        }
        let result = async {
            self.documents
                .set_status(&doc.id, DocumentStatus::Missing)
                .await?;
            self.history
                .append(&doc.id, HistoryAction::Update, "Content missing on read")
                .await
        }
        .await;
        match result {
            Ok(()) => warn!(document_id = %doc.id, path = %doc.path, "Marked missing on read"),
            Err(e) => warn!(document_id = %doc.id, error = %e, "Failed to mark missing"),
        }
    }
}
