//! Concurrent uploads of admitted files.
//!
//! Each selection becomes one batch: placeholders are appended to the timeline
//! immediately, then a batch task drives one upload task per file. Uploads are
//! independent of each other. When the last one settles the batch issues
//! exactly one persistence commit and a [`GalleryEvent::BatchFinished`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use uuid::Uuid;

use lodgia_core::{
    AssetUploader, GalleryConfig, GalleryError, MediaFile, MediaItem, MediaItemId, UploadProgress,
};

use crate::editor;
use crate::events::{EventSink, GalleryEvent};
use crate::sync::PersistenceSynchronizer;
use crate::timeline::Timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadOutcome {
    Uploaded,
    Failed,
    /// The item was removed or retried while this attempt was in flight
    Superseded,
}

/// Final tally of one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub batch_id: Uuid,
    pub uploaded: usize,
    pub failed: usize,
    pub superseded: usize,
}

/// Handle on a running batch.
#[derive(Debug)]
pub struct UploadBatch {
    pub id: Uuid,
    pub item_ids: Vec<MediaItemId>,
    settled: watch::Receiver<usize>,
    handle: JoinHandle<BatchSummary>,
}

impl UploadBatch {
    /// Share of the batch that has settled, in percent.
    pub fn progress(&self) -> u8 {
        if self.item_ids.is_empty() {
            return 100;
        }
        let settled = (*self.settled.borrow()).min(self.item_ids.len());
        (settled * 100 / self.item_ids.len()) as u8
    }

    /// Wait until every upload in the batch has settled and the commit was issued.
    pub async fn wait(self) -> Result<BatchSummary, GalleryError> {
        self.handle
            .await
            .map_err(|e| GalleryError::Internal(format!("upload batch task failed: {}", e)))
    }
}

struct UploadJob {
    item_id: MediaItemId,
    attempt: u32,
    file: MediaFile,
}

struct QueueInner {
    parent_id: String,
    uploader: Arc<dyn AssetUploader>,
    timeline: Timeline,
    synchronizer: Arc<PersistenceSynchronizer>,
    events: EventSink,
    limiter: Option<Arc<Semaphore>>,
    timeout: Option<Duration>,
    max_items: usize,
    /// Bytes of items that may still need (re)uploading
    retained: Mutex<HashMap<MediaItemId, MediaFile>>,
}

pub struct UploadQueueManager {
    inner: Arc<QueueInner>,
}

impl UploadQueueManager {
    pub fn new(
        parent_id: impl Into<String>,
        uploader: Arc<dyn AssetUploader>,
        timeline: Timeline,
        synchronizer: Arc<PersistenceSynchronizer>,
        events: EventSink,
        config: &GalleryConfig,
    ) -> Self {
        let limiter = config
            .upload_concurrency_limit()
            .map(|limit| Arc::new(Semaphore::new(limit)));

        Self {
            inner: Arc::new(QueueInner {
                parent_id: parent_id.into(),
                uploader,
                timeline,
                synchronizer,
                events,
                limiter,
                timeout: config.upload_timeout(),
                max_items: config.max_images,
                retained: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Append placeholders for `files` and start uploading them.
    ///
    /// `files` must already have passed the validation gate.
    #[tracing::instrument(skip(self, files), fields(parent_id = %self.inner.parent_id, count = files.len()))]
    pub fn enqueue(&self, files: Vec<MediaFile>) -> Result<UploadBatch, GalleryError> {
        if files.is_empty() {
            return Err(GalleryError::InvalidInput(
                "no files to upload".to_string(),
            ));
        }

        let placeholders: Vec<MediaItem> = files
            .iter()
            .map(|file| {
                let name = Some(file.name.trim().to_string()).filter(|n| !n.is_empty());
                MediaItem::pending(name, file.byte_size(), file.mime_type.clone())
            })
            .collect();

        let jobs: Vec<UploadJob> = placeholders
            .iter()
            .zip(files)
            .map(|(item, file)| UploadJob {
                item_id: item.id(),
                attempt: item.attempt(),
                file,
            })
            .collect();

        // Bytes are retained before the placeholders become visible.
        self.inner.retain(&jobs);

        let max_items = self.inner.max_items;
        if let Err(e) = self
            .inner
            .timeline
            .apply(|c| editor::append_pending(c, placeholders, max_items).map(|next| (next, ())))
        {
            for job in &jobs {
                self.inner.release(job.item_id);
            }
            return Err(e);
        }

        Ok(self.spawn_batch(jobs))
    }

    /// Start a new attempt for a failed item using its retained bytes.
    #[tracing::instrument(skip(self), fields(parent_id = %self.inner.parent_id, item_id = %item_id))]
    pub fn retry(&self, item_id: MediaItemId) -> Result<UploadBatch, GalleryError> {
        let file = self
            .inner
            .retained_file(item_id)
            .ok_or_else(|| {
                GalleryError::InvalidInput(format!(
                    "no file data retained for item {}, select the file again",
                    item_id
                ))
            })?;

        let attempt = self
            .inner
            .timeline
            .apply(|c| editor::restart_upload(c, item_id))?;

        tracing::info!(item_id = %item_id, attempt, "Retrying upload");

        Ok(self.spawn_batch(vec![UploadJob {
            item_id,
            attempt,
            file,
        }]))
    }

    /// Drop retained bytes of an item that left the gallery.
    pub fn forget(&self, item_id: MediaItemId) {
        self.inner.release(item_id);
    }

    pub fn retained_count(&self) -> usize {
        self.inner
            .retained
            .lock()
            .map(|retained| retained.len())
            .unwrap_or(0)
    }

    fn spawn_batch(&self, jobs: Vec<UploadJob>) -> UploadBatch {
        let batch_id = Uuid::new_v4();
        let item_ids = jobs.iter().map(|job| job.item_id).collect();
        let (settled_tx, settled_rx) = watch::channel(0usize);

        let handle = tokio::spawn(run_batch(
            self.inner.clone(),
            batch_id,
            jobs,
            settled_tx,
        ));

        UploadBatch {
            id: batch_id,
            item_ids,
            settled: settled_rx,
            handle,
        }
    }
}

async fn run_batch(
    inner: Arc<QueueInner>,
    batch_id: Uuid,
    jobs: Vec<UploadJob>,
    settled: watch::Sender<usize>,
) -> BatchSummary {
    let start = Instant::now();
    let total = jobs.len();
    let mut set = JoinSet::new();

    for job in jobs {
        set.spawn(upload_one(inner.clone(), job));
    }

    let mut summary = BatchSummary {
        batch_id,
        uploaded: 0,
        failed: 0,
        superseded: 0,
    };

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(UploadOutcome::Uploaded) => summary.uploaded += 1,
            Ok(UploadOutcome::Failed) => summary.failed += 1,
            Ok(UploadOutcome::Superseded) => summary.superseded += 1,
            Err(e) => {
                tracing::error!(batch_id = %batch_id, error = %e, "Upload task panicked");
                summary.failed += 1;
            }
        }
        settled.send_modify(|count| *count += 1);
    }

    // One commit per batch, taken from the timeline as it stands now so edits
    // made during the uploads are included. Sent under the read lock so a
    // concurrent edit's commit cannot be overtaken by an older list.
    inner
        .timeline
        .with_current(|current| inner.synchronizer.commit(current));

    tracing::info!(
        batch_id = %batch_id,
        parent_id = %inner.parent_id,
        total,
        uploaded = summary.uploaded,
        failed = summary.failed,
        superseded = summary.superseded,
        duration_ms = start.elapsed().as_millis() as u64,
        "Upload batch finished"
    );

    inner.events.emit(GalleryEvent::BatchFinished {
        batch_id,
        uploaded: summary.uploaded,
        failed: summary.failed,
    });

    summary
}

#[tracing::instrument(
    skip(inner, job),
    fields(item_id = %job.item_id, attempt = job.attempt, upload.status = tracing::field::Empty)
)]
async fn upload_one(inner: Arc<QueueInner>, job: UploadJob) -> UploadOutcome {
    let UploadJob {
        item_id,
        attempt,
        file,
    } = job;

    // Items waiting for a permit stay Pending.
    let _permit = match &inner.limiter {
        Some(limiter) => match limiter.clone().acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(_) => {
                return inner.record_failure(item_id, attempt, "upload queue closed".to_string())
            }
        },
        None => None,
    };

    if !inner
        .timeline
        .merge(|c| editor::begin_upload(c, item_id, attempt))
    {
        tracing::Span::current().record("upload.status", "superseded");
        tracing::debug!(item_id = %item_id, "Item left the gallery before its upload started");
        return UploadOutcome::Superseded;
    }

    let progress = {
        let timeline = inner.timeline.clone();
        UploadProgress::new(move |percent| {
            timeline.merge(|c| editor::record_progress(c, item_id, attempt, percent));
        })
    };

    let start = Instant::now();
    let upload = inner.uploader.upload(&inner.parent_id, &file, progress);
    let result = match inner.timeout {
        Some(limit) => match tokio::time::timeout(limit, upload).await {
            Ok(result) => result,
            Err(_) => Err(GalleryError::Upload(format!(
                "upload timed out after {}s",
                limit.as_secs()
            ))),
        },
        None => upload.await,
    };

    match result {
        Ok(url) if !url.trim().is_empty() => {
            if inner
                .timeline
                .merge(|c| editor::complete_upload(c, item_id, attempt, url.clone()))
            {
                inner.release(item_id);
                tracing::Span::current().record("upload.status", "uploaded");
                tracing::info!(
                    item_id = %item_id,
                    url = %url,
                    size_bytes = file.byte_size(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Upload completed"
                );
                UploadOutcome::Uploaded
            } else {
                tracing::Span::current().record("upload.status", "superseded");
                tracing::debug!(item_id = %item_id, url = %url, "Discarding stale upload result");
                UploadOutcome::Superseded
            }
        }
        Ok(_) => inner.record_failure(
            item_id,
            attempt,
            "upload returned an empty URL".to_string(),
        ),
        Err(e) => inner.record_failure(item_id, attempt, e.to_string()),
    }
}

impl QueueInner {
    fn record_failure(&self, item_id: MediaItemId, attempt: u32, message: String) -> UploadOutcome {
        let landed = self
            .timeline
            .merge(|c| editor::fail_upload(c, item_id, attempt, message.clone()));

        if !landed {
            tracing::Span::current().record("upload.status", "superseded");
            return UploadOutcome::Superseded;
        }

        tracing::Span::current().record("upload.status", "failed");
        tracing::warn!(
            item_id = %item_id,
            attempt,
            parent_id = %self.parent_id,
            error = %message,
            "Upload failed"
        );
        self.events.emit(GalleryEvent::UploadFailed {
            item_id,
            attempt,
            message,
        });
        UploadOutcome::Failed
    }

    fn retain(&self, jobs: &[UploadJob]) {
        if let Ok(mut retained) = self.retained.lock() {
            for job in jobs {
                retained.insert(job.item_id, job.file.clone());
            }
        }
    }

    fn retained_file(&self, item_id: MediaItemId) -> Option<MediaFile> {
        self.retained
            .lock()
            .ok()
            .and_then(|retained| retained.get(&item_id).cloned())
    }

    fn release(&self, item_id: MediaItemId) {
        if let Ok(mut retained) = self.retained.lock() {
            retained.remove(&item_id);
        }
    }
}
