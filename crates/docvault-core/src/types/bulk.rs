//! Outcome of operations applied to several documents at once.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};
use crate::types::id::DocumentId;

/// One item of a bulk operation that did not apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkFailure {
    /// The document that failed.
    pub id: DocumentId,
    /// Error category.
    pub kind: ErrorKind,
    /// Human-readable reason.
    pub message: String,
}

/// Per-item results of a bulk operation.
///
/// `succeeded == 0` with failures means nothing changed; a non-zero
/// `succeeded` alongside failures means the operation was partially applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkOutcome {
    /// Number of items that were applied.
    pub succeeded: usize,
    /// Items deliberately left alone (e.g. folders for copy, vanished sources).
    pub skipped: Vec<DocumentId>,
    /// Items that failed, with their errors.
    pub failed: Vec<BulkFailure>,
}

impl BulkOutcome {
    /// Record a success.
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    /// Record a skipped item.
    pub fn record_skip(&mut self, id: DocumentId) {
        self.skipped.push(id);
    }

    /// Record a failed item.
    pub fn record_failure(&mut self, id: DocumentId, err: &AppError) {
        self.failed.push(BulkFailure {
            id,
            kind: err.kind,
            message: err.message.clone(),
        });
    }

    /// Whether some, but not all, attempted items were applied.
    pub fn is_partial(&self) -> bool {
        self.succeeded > 0 && !self.failed.is_empty()
    }

    /// Whether nothing was applied.
    pub fn is_noop(&self) -> bool {
        self.succeeded == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_outcome_is_distinguishable() {
        let mut outcome = BulkOutcome::default();
        assert!(outcome.is_noop());

        outcome.record_failure(DocumentId::from("a"), &AppError::not_found("gone"));
        assert!(outcome.is_noop());
        assert!(!outcome.is_partial());

        outcome.record_success();
        assert!(outcome.is_partial());
        assert_eq!(outcome.failed[0].kind, ErrorKind::NotFound);
    }
}
