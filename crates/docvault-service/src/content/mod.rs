//! Reading and writing document content.

pub mod service;

pub use service::{ContentService, ContentStream, UploadRequest};
