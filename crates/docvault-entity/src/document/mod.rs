//! Document and folder catalog entities.

pub mod model;
pub mod status;

pub use model::{DocumentEntity, NewDocument, SOURCE_LOCAL, SOURCE_UPLOAD};
pub use status::{DocumentStatus, DocumentType};
