//! History entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use docvault_core::types::DocumentId;

/// The action a history entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    /// Entity created (folder creation, upload).
    Create,
    /// Content, tags, status, or sharing changed.
    Update,
    /// Moved to trash.
    Delete,
    /// Restored from trash.
    Restore,
    /// Renamed in place.
    Rename,
    /// Moved to another directory.
    Move,
    /// Created as a copy of another entity.
    Copy,
    /// Discovered or reconciled by a scan.
    Sync,
}

impl HistoryAction {
    /// Return the action as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Restore => "restore",
            Self::Rename => "rename",
            Self::Move => "move",
            Self::Copy => "copy",
            Self::Sync => "sync",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable record of something that happened to a document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Row identifier.
    pub id: i64,
    /// The document the entry refers to (weak reference).
    pub document_id: DocumentId,
    /// What happened.
    pub action: HistoryAction,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Free-text details.
    pub details: String,
}
