//! Shared value types used across DocVault crates.

pub mod bulk;
pub mod id;

pub use bulk::{BulkFailure, BulkOutcome};
pub use id::DocumentId;
