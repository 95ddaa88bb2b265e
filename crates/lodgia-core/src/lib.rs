//! Lodgia Core Library
//!
//! This crate provides the domain models, error types, configuration, admission
//! rules and collaborator traits shared by all Lodgia components.

pub mod config;
pub mod error;
pub mod hooks;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::GalleryConfig;
pub use error::{ErrorMetadata, GalleryError, LogLevel};
pub use hooks::{AssetDeleter, AssetUploader, ImageListStore, NoOpAssetDeleter, UploadProgress};
pub use models::{Collection, MediaFile, MediaItem, MediaItemId, StateCounts, UploadState};
pub use validation::{Admission, ImageValidator, Rejection, ValidationError, ValidationGate};
