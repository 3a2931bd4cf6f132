//! Repository implementations for the catalog tables.

pub mod document;
pub mod history;

pub use document::DocumentRepository;
pub use history::HistoryRepository;
