//! # docvault-entity
//!
//! Catalog entity models for DocVault. Every struct in this crate
//! represents a catalog row or a listing value object. Catalog rows
//! additionally derive `sqlx::FromRow`.

pub mod document;
pub mod history;
pub mod listing;

pub use document::{DocumentEntity, DocumentStatus, DocumentType, NewDocument};
pub use history::{HistoryAction, HistoryEntry};
pub use listing::{FolderItem, InferredFolder};
