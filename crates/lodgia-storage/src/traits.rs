//! Storage abstraction trait
//!
//! This module defines the Storage trait that photo storage backends implement.

use async_trait::async_trait;
use bytes::Bytes;
use lodgia_core::GalleryError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Corrupt image list: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for GalleryError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UploadFailed(msg) => GalleryError::Upload(msg),
            StorageError::DeleteFailed(msg) => GalleryError::Deletion(msg),
            StorageError::ConfigError(msg) => GalleryError::Config(msg),
            StorageError::InvalidKey(msg) => GalleryError::InvalidInput(msg),
            other => GalleryError::Persistence(other.to_string()),
        }
    }
}

/// Storage abstraction trait
///
/// **Key format:** photos are grouped per parent entity:
/// `media/{parent_id}/{unique}-{filename}`. See the `keys` module.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store a photo and return (storage_key, storage_url)
    async fn upload(
        &self,
        parent_id: &str,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<(String, String)>;

    /// Delete a file by its storage key. Deleting a missing file succeeds.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Map a public URL produced by this backend back to its storage key.
    /// Returns `None` for URLs this backend did not hand out.
    fn key_for_url(&self, url: &str) -> Option<String>;
}
