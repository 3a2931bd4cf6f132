//! # docvault-service
//!
//! Business logic for the document catalog. Each service orchestrates the
//! catalog repositories and the storage provider to keep the physical tree
//! and the catalog in agreement.
//!
//! Services follow constructor injection: repositories and the storage
//! provider are handed in as `Arc` references. [`DocumentService`] is the
//! facade the outer layers (HTTP, CLI, scheduler) drive.

pub mod content;
pub mod copy;
pub mod document;
pub mod folder;
pub mod rewrite;
pub mod scan;
pub mod share;
pub mod trash;

pub use content::{ContentService, ContentStream, UploadRequest};
pub use copy::CopyService;
pub use document::DocumentService;
pub use folder::{FolderService, resolve_children};
pub use rewrite::{NameAllocator, PathRewriteService, Relocation};
pub use scan::{ScanReport, ScanService};
pub use share::LinkService;
pub use trash::TrashService;
