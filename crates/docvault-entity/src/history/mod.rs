//! Append-only action log entities.

pub mod model;

pub use model::{HistoryAction, HistoryEntry};
