//! Document catalog facade.

pub mod service;

pub use service::DocumentService;
