//! Collaborator traits
//!
//! The gallery engine never talks to the network or a database directly. It
//! depends on these interfaces; the storage crate provides filesystem-backed
//! implementations and the host application may provide its own.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::GalleryError;
use crate::models::MediaFile;

/// Per-item progress sink handed to an uploader for one attempt.
///
/// Reports are percentages; anything above 100 is clamped by the receiver.
#[derive(Clone)]
pub struct UploadProgress {
    sink: Arc<dyn Fn(u8) + Send + Sync>,
}

impl UploadProgress {
    pub fn new(sink: impl Fn(u8) + Send + Sync + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn report(&self, percent: u8) {
        (self.sink)(percent.min(100));
    }

    /// Report byte-level progress of this one file.
    pub fn report_bytes(&self, sent: u64, total: u64) {
        if total == 0 {
            return;
        }
        let percent = (sent.min(total) * 100 / total) as u8;
        self.report(percent);
    }
}

impl fmt::Debug for UploadProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadProgress").finish_non_exhaustive()
    }
}

/// Stores the bytes of one photo and returns its public URL.
///
/// Timeouts are the implementation's responsibility; any error is treated as
/// a failed attempt.
#[async_trait]
pub trait AssetUploader: Send + Sync {
    async fn upload(
        &self,
        parent_id: &str,
        file: &MediaFile,
        progress: UploadProgress,
    ) -> Result<String, GalleryError>;
}

/// Persists the ordered image URL list of a parent entity.
#[async_trait]
pub trait ImageListStore: Send + Sync {
    /// URLs currently committed on the parent entity, in order.
    async fn load(&self, parent_id: &str) -> Result<Vec<String>, GalleryError>;

    /// Replace the committed list with `ordered_urls`.
    async fn save(&self, parent_id: &str, ordered_urls: &[String]) -> Result<(), GalleryError>;
}

/// Removes the remote bytes behind an uploaded URL.
#[async_trait]
pub trait AssetDeleter: Send + Sync {
    async fn delete_asset(&self, url: &str) -> Result<(), GalleryError>;
}

/// Deleter used when remote cleanup is handled elsewhere
pub struct NoOpAssetDeleter;

#[async_trait]
impl AssetDeleter for NoOpAssetDeleter {
    async fn delete_asset(&self, _url: &str) -> Result<(), GalleryError> {
        Ok(())
    }
}
