//! Lodgia Storage Library
//!
//! This crate provides the filesystem-backed collaborators of a Lodgia gallery:
//! a photo storage backend behind the `Storage` trait, the `StorageAssets`
//! adapter that uploads and deletes gallery photos through it, and a JSON
//! image list store.
//!
//! # Storage key format
//!
//! Photos are grouped by parent entity: `media/{parent_id}/{unique}-{filename}`.
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in the
//! `keys` module.

pub mod assets;
pub mod factory;
pub(crate) mod keys;
pub mod list_store;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use assets::StorageAssets;
pub use factory::{create_list_store, create_storage};
pub use list_store::{JsonImageListStore, StoredImageList};
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
