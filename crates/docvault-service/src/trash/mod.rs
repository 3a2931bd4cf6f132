//! Trash lifecycle management.

pub mod service;

pub use service::TrashService;
