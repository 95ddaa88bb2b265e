//! Gallery collaborators backed by a [`Storage`] backend.

use std::sync::Arc;

use async_trait::async_trait;
use lodgia_core::{AssetDeleter, AssetUploader, GalleryError, MediaFile, UploadProgress};

use crate::traits::Storage;

/// Uploads gallery photos to, and deletes them from, a storage backend.
#[derive(Clone)]
pub struct StorageAssets {
    storage: Arc<dyn Storage>,
}

impl StorageAssets {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl AssetUploader for StorageAssets {
    #[tracing::instrument(skip_all, fields(parent_id = %parent_id, file_name = %file.name))]
    async fn upload(
        &self,
        parent_id: &str,
        file: &MediaFile,
        progress: UploadProgress,
    ) -> Result<String, GalleryError> {
        progress.report(0);

        let (_key, url) = self
            .storage
            .upload(parent_id, &file.name, &file.mime_type, file.data.clone())
            .await?;

        progress.report(100);
        Ok(url)
    }
}

#[async_trait]
impl AssetDeleter for StorageAssets {
    async fn delete_asset(&self, url: &str) -> Result<(), GalleryError> {
        let key = self.storage.key_for_url(url).ok_or_else(|| {
            GalleryError::Deletion(format!("{} is not managed by this storage", url))
        })?;

        self.storage.delete(&key).await?;
        Ok(())
    }
}
