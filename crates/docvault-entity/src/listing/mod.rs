//! Folder listing value objects.

pub mod item;

pub use item::{FolderItem, InferredFolder};
