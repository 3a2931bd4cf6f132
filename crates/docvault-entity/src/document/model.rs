//! Document entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use docvault_core::types::DocumentId;

use super::status::{DocumentStatus, DocumentType};

/// Provenance tag for entities discovered on the local disk.
pub const SOURCE_LOCAL: &str = "local";

/// Provenance tag for entities written through the upload path.
pub const SOURCE_UPLOAD: &str = "upload";

/// A file or folder node in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEntity {
    /// Unique document identifier.
    pub id: DocumentId,
    /// Leaf name (no separators).
    pub name: String,
    /// Display grouping, conventionally the parent directory name.
    pub category: String,
    /// Canonical root-relative virtual path.
    pub path: String,
    /// File or folder.
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    /// Provenance tag (`local`, `upload`, or a provider id).
    pub cloud_source: String,
    /// Health relative to the physical counterpart.
    pub status: DocumentStatus,
    /// Whether the bytes on disk are an encrypted container.
    pub encrypted: bool,
    /// Plaintext byte length; `None` for folders.
    pub file_size: Option<i64>,
    /// Ordered free-text labels.
    pub tags: Json<Vec<String>>,
    /// First discovery or creation time. Never changes.
    pub uploaded_at: DateTime<Utc>,
    /// Last content, name, or path change.
    pub last_modified: DateTime<Utc>,
    /// Soft-delete flag.
    pub deleted: bool,
    /// Whether a public share token is active.
    pub is_shared: bool,
    /// The public share token, if shared.
    pub share_token: Option<String>,
}

impl DocumentEntity {
    /// Whether this row is a folder.
    pub fn is_folder(&self) -> bool {
        self.doc_type == DocumentType::Folder
    }

    /// Whether `other` lives strictly below this entity's path.
    pub fn is_ancestor_of(&self, other_path: &str) -> bool {
        other_path.len() > self.path.len() + 1
            && other_path.starts_with(&self.path)
            && other_path.as_bytes()[self.path.len()] == b'/'
    }

    /// The virtual path of the directory holding this entity (`""` at the root).
    pub fn parent_path(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) => &self.path[..idx],
            None => "",
        }
    }

    /// The tags as a plain slice.
    pub fn tag_list(&self) -> &[String] {
        &self.tags.0
    }
}

/// Data required to insert a new catalog row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    /// Identifier to assign.
    pub id: DocumentId,
    /// Leaf name.
    pub name: String,
    /// Display grouping.
    pub category: String,
    /// Virtual path.
    pub path: String,
    /// File or folder.
    pub doc_type: DocumentType,
    /// Provenance tag.
    pub cloud_source: String,
    /// Initial status.
    pub status: DocumentStatus,
    /// Whether the bytes are encrypted.
    pub encrypted: bool,
    /// Plaintext size, `None` for folders.
    pub file_size: Option<i64>,
    /// Initial tags.
    pub tags: Vec<String>,
    /// Creation or discovery time.
    pub uploaded_at: DateTime<Utc>,
    /// Content modification time (disk mtime for scanned and copied files).
    pub last_modified: DateTime<Utc>,
}

impl NewDocument {
    /// A folder row with the given id, stamped now.
    pub fn folder(id: DocumentId, name: &str, path: &str, category: &str, source: &str) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.to_string(),
            category: category.to_string(),
            path: path.to_string(),
            doc_type: DocumentType::Folder,
            cloud_source: source.to_string(),
            status: DocumentStatus::Valid,
            encrypted: false,
            file_size: None,
            tags: Vec::new(),
            uploaded_at: now,
            last_modified: now,
        }
    }
}
