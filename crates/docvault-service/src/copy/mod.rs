//! Duplicating files into another directory.

pub mod service;

pub use service::CopyService;
