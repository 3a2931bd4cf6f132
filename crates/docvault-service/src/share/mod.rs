//! Public share tokens.

pub mod link;

pub use link::LinkService;
