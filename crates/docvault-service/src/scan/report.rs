//! Scan result counters.

use serde::{Deserialize, Serialize};

/// What a single scan pass observed and changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Directories visited (excluding skipped ones).
    pub directories: usize,
    /// Files visited.
    pub files: usize,
    /// Rows inserted for newly discovered entries.
    pub inserted: usize,
    /// Rows updated because disk state changed.
    pub updated: usize,
    /// Rows flipped to `missing`.
    pub marked_missing: usize,
    /// Entries that failed and were skipped.
    pub errors: usize,
}

impl ScanReport {
    /// Number of catalog rows this pass wrote.
    pub fn mutations(&self) -> usize {
        self.inserted + self.updated + self.marked_missing
    }
}
