//! The gallery state container.
//!
//! A `Gallery` owns the ordered collection of one parent entity (a rental
//! property or room) and is the only way to change it. The interface layer
//! forwards operator gestures to the `on_*` methods and renders snapshots from
//! [`Gallery::subscribe`]; failures arrive on [`Gallery::events`].

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use lodgia_core::{
    AssetDeleter, AssetUploader, Collection, ErrorMetadata, GalleryConfig, GalleryError,
    ImageListStore, LogLevel, MediaFile, MediaItem, MediaItemId, NoOpAssetDeleter, Rejection,
    ValidationError, ValidationGate,
};

use crate::editor;
use crate::events::{EventSink, GalleryEvent};
use crate::sync::PersistenceSynchronizer;
use crate::timeline::Timeline;
use crate::upload_queue::{UploadBatch, UploadQueueManager};

/// External services a gallery talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub uploader: Arc<dyn AssetUploader>,
    pub list_store: Arc<dyn ImageListStore>,
    pub deleter: Arc<dyn AssetDeleter>,
}

impl Collaborators {
    /// Collaborators without remote cleanup of removed photos.
    pub fn new(uploader: Arc<dyn AssetUploader>, list_store: Arc<dyn ImageListStore>) -> Self {
        Self {
            uploader,
            list_store,
            deleter: Arc::new(NoOpAssetDeleter),
        }
    }

    pub fn with_deleter(mut self, deleter: Arc<dyn AssetDeleter>) -> Self {
        self.deleter = deleter;
        self
    }
}

/// Result of handing a file selection to the gallery.
#[derive(Debug)]
pub struct Selection {
    /// `None` when nothing was admitted
    pub batch: Option<UploadBatch>,
    pub rejected: Vec<Rejection>,
}

pub struct Gallery {
    parent_id: String,
    gate: ValidationGate,
    timeline: Timeline,
    queue: UploadQueueManager,
    synchronizer: Arc<PersistenceSynchronizer>,
    deleter: Arc<dyn AssetDeleter>,
    events: EventSink,
}

impl Gallery {
    /// Seed a gallery from the list currently stored for `parent_id`.
    #[tracing::instrument(skip_all, fields(parent_id = %parent_id))]
    pub async fn load(
        parent_id: &str,
        collaborators: Collaborators,
        config: &GalleryConfig,
    ) -> Result<Self, GalleryError> {
        let urls = collaborators.list_store.load(parent_id).await?;
        tracing::debug!(parent_id = %parent_id, count = urls.len(), "Loaded committed image list");
        Ok(Self::with_committed_urls(parent_id, urls, collaborators, config))
    }

    /// Build a gallery from URLs the caller already holds.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_committed_urls(
        parent_id: impl Into<String>,
        urls: Vec<String>,
        collaborators: Collaborators,
        config: &GalleryConfig,
    ) -> Self {
        let parent_id = parent_id.into();
        let events = EventSink::new();
        let timeline = Timeline::new(Collection::from_committed_urls(urls.clone()));

        let synchronizer = Arc::new(PersistenceSynchronizer::spawn(
            parent_id.clone(),
            collaborators.list_store,
            config.persist_debounce(),
            urls,
            events.clone(),
        ));

        let queue = UploadQueueManager::new(
            parent_id.clone(),
            collaborators.uploader,
            timeline.clone(),
            synchronizer.clone(),
            events.clone(),
            config,
        );

        Self {
            parent_id,
            gate: ValidationGate::from_config(config),
            timeline,
            queue,
            synchronizer,
            deleter: collaborators.deleter,
            events,
        }
    }

    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    pub fn snapshot(&self) -> Collection {
        self.timeline.snapshot()
    }

    pub fn committed_urls(&self) -> Vec<String> {
        self.timeline.snapshot().committed_urls()
    }

    /// Stream of snapshots, woken on every real change.
    pub fn subscribe(&self) -> watch::Receiver<Collection> {
        self.timeline.subscribe()
    }

    /// Stream of operator notifications.
    pub fn events(&self) -> broadcast::Receiver<GalleryEvent> {
        self.events.subscribe()
    }

    /// Admit what fits, start uploading it, and report the rest as rejected.
    pub fn on_files_selected(&self, files: Vec<MediaFile>) -> Selection {
        let current_len = self.timeline.snapshot().len();
        let admission = self.gate.admit(files, current_len);
        let mut rejected = admission.rejected;

        let batch = if admission.admitted.is_empty() {
            None
        } else {
            let names: Vec<String> = admission.admitted.iter().map(|f| f.name.clone()).collect();
            match self.queue.enqueue(admission.admitted) {
                Ok(batch) => Some(batch),
                Err(e) => {
                    // Another selection filled the gallery since we looked.
                    self.log_edit_error("files_selected", &e);
                    let reason = ValidationError::CapacityExceeded {
                        max: self.gate.max_items(),
                    };
                    rejected.extend(names.into_iter().map(|file_name| Rejection {
                        file_name,
                        reason: reason.clone(),
                    }));
                    None
                }
            }
        };

        for rejection in &rejected {
            self.events.emit(GalleryEvent::from(rejection));
        }

        Selection { batch, rejected }
    }

    /// Drag gesture, with indices taken from the snapshot the operator saw.
    pub fn on_drag_reorder(&self, source: usize, target: usize) -> Result<(), GalleryError> {
        self.edit("drag_reorder", |c| editor::reorder(c, source, target))
    }

    pub fn on_set_primary(&self, item_id: MediaItemId) -> Result<(), GalleryError> {
        self.edit("set_primary", |c| editor::set_primary(c, item_id))
    }

    /// Remove an item locally, then ask the deletion collaborator to clean up
    /// its remote bytes. A cleanup failure is reported but never undoes the
    /// removal.
    pub async fn on_remove(&self, item_id: MediaItemId) -> Result<MediaItem, GalleryError> {
        let removed = self
            .timeline
            .apply(|c| editor::remove(c, item_id))
            .inspect_err(|e| self.log_edit_error("remove", e))?;

        self.queue.forget(item_id);
        self.commit();

        tracing::info!(
            parent_id = %self.parent_id,
            item_id = %item_id,
            state = %removed.upload_state(),
            "Removed gallery item"
        );

        if let Some(url) = removed.source_url().filter(|_| removed.is_uploaded()) {
            if let Err(e) = self.deleter.delete_asset(url).await {
                tracing::warn!(
                    parent_id = %self.parent_id,
                    item_id = %item_id,
                    url = %url,
                    error = %e,
                    "Failed to delete remote asset"
                );
                self.events.emit(GalleryEvent::DeletionFailed {
                    url: url.to_string(),
                    message: e.to_string(),
                });
            }
        }

        Ok(removed)
    }

    /// Rename only touches the display name, so nothing is committed.
    pub fn on_rename(&self, item_id: MediaItemId, text: &str) -> Result<(), GalleryError> {
        self.timeline
            .apply(|c| editor::rename(c, item_id, text).map(|next| (next, ())))
            .inspect_err(|e| self.log_edit_error("rename", e))
    }

    /// New upload attempt for a failed item.
    pub fn retry(&self, item_id: MediaItemId) -> Result<UploadBatch, GalleryError> {
        self.queue
            .retry(item_id)
            .inspect_err(|e| self.log_edit_error("retry", e))
    }

    /// Give up on a failed item.
    pub fn dismiss(&self, item_id: MediaItemId) -> Result<MediaItem, GalleryError> {
        let dismissed = self
            .timeline
            .apply(|c| editor::dismiss(c, item_id))
            .inspect_err(|e| self.log_edit_error("dismiss", e))?;
        self.queue.forget(item_id);
        Ok(dismissed)
    }

    /// Number of files whose bytes are still held for a possible retry.
    pub fn retained_uploads(&self) -> usize {
        self.queue.retained_count()
    }

    /// Save any pending commit now.
    pub async fn flush(&self) -> Result<(), GalleryError> {
        self.synchronizer.flush().await
    }

    /// Flush and stop background persistence. Uploads still in flight keep
    /// running but their results will not be saved.
    pub async fn shutdown(&self) -> Result<(), GalleryError> {
        tracing::debug!(parent_id = %self.parent_id, "Shutting down gallery");
        self.synchronizer.shutdown().await
    }

    /// Apply a structural edit and commit the resulting order.
    fn edit<F>(&self, operation: &'static str, op: F) -> Result<(), GalleryError>
    where
        F: FnOnce(&Collection) -> Result<Collection, GalleryError>,
    {
        self.timeline
            .apply(|c| op(c).map(|next| (next, ())))
            .inspect_err(|e| self.log_edit_error(operation, e))?;
        self.commit();
        Ok(())
    }

    /// Hand the current committed list to the synchronizer. The send happens
    /// under the timeline's read lock, so commits reach the synchronizer in
    /// the same order as the mutations they reflect.
    fn commit(&self) {
        self.timeline
            .with_current(|current| self.synchronizer.commit(current));
    }

    fn log_edit_error(&self, operation: &'static str, e: &GalleryError) {
        match e.log_level() {
            LogLevel::Debug => tracing::debug!(
                parent_id = %self.parent_id,
                operation,
                error_code = e.error_code(),
                error = %e,
                "Gallery edit rejected"
            ),
            LogLevel::Warn => tracing::warn!(
                parent_id = %self.parent_id,
                operation,
                error_code = e.error_code(),
                error = %e,
                "Gallery edit rejected"
            ),
            LogLevel::Error => tracing::error!(
                parent_id = %self.parent_id,
                operation,
                error_code = e.error_code(),
                error = %e.detailed_message(),
                "Gallery edit failed"
            ),
        }
    }
}
