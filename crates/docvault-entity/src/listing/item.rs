//! Items shown when listing the direct children of a virtual folder.
//!
//! A listing mixes persisted catalog rows with folders that only exist
//! because some deeper path runs through them. The two are kept apart by
//! [`FolderItem`] so inferred folders can never be handed to code that
//! mutates catalog rows.

use serde::{Deserialize, Serialize};

use docvault_core::types::DocumentId;

use crate::document::{DocumentEntity, DocumentStatus};

/// A folder implied by descendant paths but without its own catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredFolder {
    /// `folder-implicit-<name>`.
    pub id: DocumentId,
    /// Folder name (one path segment).
    pub name: String,
    /// Virtual path of the folder.
    pub path: String,
}

impl InferredFolder {
    /// Build the inferred folder `name` under `parent_path`.
    pub fn new(parent_path: &str, name: &str) -> Self {
        let path = if parent_path.is_empty() {
            name.to_string()
        } else {
            format!("{parent_path}/{name}")
        };
        Self {
            id: DocumentId::implicit_folder(name),
            name: name.to_string(),
            path,
        }
    }

    /// Inferred folders are always reported valid.
    pub fn status(&self) -> DocumentStatus {
        DocumentStatus::Valid
    }
}

/// One entry of a folder listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "lowercase")]
pub enum FolderItem {
    /// A persisted catalog row.
    Explicit(DocumentEntity),
    /// A folder synthesized from descendant paths.
    Inferred(InferredFolder),
}

impl FolderItem {
    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            Self::Explicit(doc) => &doc.name,
            Self::Inferred(folder) => &folder.name,
        }
    }

    /// Virtual path.
    pub fn path(&self) -> &str {
        match self {
            Self::Explicit(doc) => &doc.path,
            Self::Inferred(folder) => &folder.path,
        }
    }

    /// Identifier (catalog id or synthesized id).
    pub fn id(&self) -> &DocumentId {
        match self {
            Self::Explicit(doc) => &doc.id,
            Self::Inferred(folder) => &folder.id,
        }
    }

    /// Whether the item is a folder of either origin.
    pub fn is_folder(&self) -> bool {
        match self {
            Self::Explicit(doc) => doc.is_folder(),
            Self::Inferred(_) => true,
        }
    }

    /// The catalog row, if this item is persisted.
    pub fn as_entity(&self) -> Option<&DocumentEntity> {
        match self {
            Self::Explicit(doc) => Some(doc),
            Self::Inferred(_) => None,
        }
    }
}
