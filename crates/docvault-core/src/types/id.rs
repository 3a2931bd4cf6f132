//! Catalog identifiers.
//!
//! Document ids are opaque strings. Folders created explicitly carry the
//! [`FOLDER_PREFIX`] so callers can tell persisted folder rows from the
//! folders the listing resolver infers ([`IMPLICIT_FOLDER_PREFIX`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix carried by ids of folders created through folder creation.
pub const FOLDER_PREFIX: &str = "folder-";

/// Prefix carried by ids the listing resolver synthesizes.
pub const IMPLICIT_FOLDER_PREFIX: &str = "folder-implicit-";

/// Unique identifier for a catalog entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    /// A fresh id for a discovered, uploaded, or copied entity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// A fresh id for an explicitly created folder.
    pub fn generate_folder() -> Self {
        Self(format!("{FOLDER_PREFIX}{}", Uuid::new_v4()))
    }

    /// The id the listing resolver gives an inferred folder.
    pub fn implicit_folder(name: &str) -> Self {
        Self(format!("{IMPLICIT_FOLDER_PREFIX}{name}"))
    }

    /// Whether this id names an inferred folder rather than a catalog row.
    pub fn is_implicit(&self) -> bool {
        self.0.starts_with(IMPLICIT_FOLDER_PREFIX)
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DocumentId {
    type Err = crate::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(crate::AppError::validation("Document id cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_ids_carry_prefix() {
        assert!(DocumentId::generate_folder().as_str().starts_with(FOLDER_PREFIX));
        assert!(!DocumentId::generate().as_str().starts_with(FOLDER_PREFIX));
    }

    #[test]
    fn implicit_ids_are_recognized() {
        let id = DocumentId::implicit_folder("Finance");
        assert_eq!(id.as_str(), "folder-implicit-Finance");
        assert!(id.is_implicit());
        assert!(!DocumentId::generate_folder().is_implicit());
    }

    #[test]
    fn blank_id_is_rejected() {
        assert!("  ".parse::<DocumentId>().is_err());
    }
}
