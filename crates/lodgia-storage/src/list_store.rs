//! File-backed image list store.
//!
//! One JSON document per parent entity:
//! `{ "parent_id": "...", "urls": [...], "updated_at": "..." }`.
//! Writes go to a temporary file first and are renamed into place, so a crash
//! mid-save never leaves a truncated list behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lodgia_core::{GalleryError, ImageListStore};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::traits::{StorageError, StorageResult};

/// Stored form of one parent's ordered image list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredImageList {
    pub parent_id: String,
    pub urls: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct JsonImageListStore {
    dir: PathBuf,
}

impl JsonImageListStore {
    pub async fn new(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create image list directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    /// Percent-encoded so distinct parent ids never share a file.
    fn path_for(&self, parent_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", urlencoding::encode(parent_id)))
    }

    /// Full stored record, if one exists.
    pub async fn read(&self, parent_id: &str) -> StorageResult<Option<StoredImageList>> {
        let path = self.path_for(parent_id);
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }

        let raw = fs::read(&path).await?;
        let stored: StoredImageList = serde_json::from_slice(&raw)
            .map_err(|e| StorageError::Corrupt(format!("{}: {}", path.display(), e)))?;

        if stored.parent_id != parent_id {
            return Err(StorageError::Corrupt(format!(
                "{} belongs to '{}', expected '{}'",
                path.display(),
                stored.parent_id,
                parent_id
            )));
        }

        Ok(Some(stored))
    }

    pub async fn write(&self, parent_id: &str, urls: &[String]) -> StorageResult<StoredImageList> {
        let record = StoredImageList {
            parent_id: parent_id.to_string(),
            urls: urls.to_vec(),
            updated_at: Utc::now(),
        };
        let content = serde_json::to_vec_pretty(&record)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;

        write_atomic(&self.path_for(parent_id), &content).await?;
        Ok(record)
    }
}

async fn write_atomic(path: &Path, content: &[u8]) -> StorageResult<()> {
    let temp_path = path.with_extension("json.tmp");

    fs::write(&temp_path, content).await?;

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e.into());
    }

    Ok(())
}

#[async_trait]
impl ImageListStore for JsonImageListStore {
    async fn load(&self, parent_id: &str) -> Result<Vec<String>, GalleryError> {
        Ok(self
            .read(parent_id)
            .await?
            .map(|stored| stored.urls)
            .unwrap_or_default())
    }

    async fn save(&self, parent_id: &str, ordered_urls: &[String]) -> Result<(), GalleryError> {
        self.write(parent_id, ordered_urls)
            .await
            .map_err(|e| GalleryError::Persistence(e.to_string()))?;
        tracing::debug!(
            parent_id = %parent_id,
            count = ordered_urls.len(),
            "Image list written"
        );
        Ok(())
    }
}
