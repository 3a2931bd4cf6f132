//! Path rewrites: rename and move with subtree cascades.

pub mod naming;
pub mod service;

pub use naming::NameAllocator;
pub use service::{PathRewriteService, Relocation};
