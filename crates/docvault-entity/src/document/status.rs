//! Document type and status enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a catalog row is a file or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// A regular file.
    File,
    /// A directory.
    Folder,
}

impl DocumentType {
    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Health of a catalog row relative to its physical counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Present on disk with content.
    Valid,
    /// Present on disk but empty.
    Corrupted,
    /// No physical counterpart could be found.
    Missing,
}

impl DocumentStatus {
    /// Status for a file of the given on-disk size. Zero bytes is always corrupted.
    pub fn for_size(size_bytes: u64) -> Self {
        if size_bytes == 0 {
            Self::Corrupted
        } else {
            Self::Valid
        }
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Corrupted => "corrupted",
            Self::Missing => "missing",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = docvault_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "valid" => Ok(Self::Valid),
            "corrupted" => Ok(Self::Corrupted),
            "missing" => Ok(Self::Missing),
            _ => Err(docvault_core::AppError::validation(format!(
                "Invalid document status: '{s}'. Expected one of: valid, corrupted, missing"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_bytes_is_corrupted() {
        assert_eq!(DocumentStatus::for_size(0), DocumentStatus::Corrupted);
        assert_eq!(DocumentStatus::for_size(1), DocumentStatus::Valid);
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("MISSING".parse::<DocumentStatus>().unwrap(), DocumentStatus::Missing);
        assert!("broken".parse::<DocumentStatus>().is_err());
    }
}
