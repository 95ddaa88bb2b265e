use crate::list_store::JsonImageListStore;
use crate::local::LocalStorage;
use crate::{Storage, StorageError, StorageResult};
use lodgia_core::GalleryConfig;
use std::sync::Arc;

/// Create the photo storage backend from configuration
pub async fn create_storage(config: &GalleryConfig) -> StorageResult<Arc<dyn Storage>> {
    let base_path = config
        .local_storage_path
        .clone()
        .ok_or_else(|| StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string()))?;
    let base_url = config.local_storage_base_url.clone().ok_or_else(|| {
        StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
    })?;

    let storage = LocalStorage::new(base_path, base_url).await?;
    Ok(Arc::new(storage))
}

/// Create the image list store from configuration
pub async fn create_list_store(config: &GalleryConfig) -> StorageResult<JsonImageListStore> {
    let dir = config
        .image_list_path
        .clone()
        .ok_or_else(|| StorageError::ConfigError("IMAGE_LIST_PATH not configured".to_string()))?;

    JsonImageListStore::new(dir).await
}
