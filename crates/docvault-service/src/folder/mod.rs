//! Folder creation and direct-children listings.

pub mod resolver;
pub mod service;

pub use resolver::resolve_children;
pub use service::FolderService;
