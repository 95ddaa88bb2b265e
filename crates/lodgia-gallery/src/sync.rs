//! Debounced persistence of the committed image list.
//!
//! Commits are fire-and-forget. A background task keeps only the most recent
//! list and saves it once the commits have been quiet for the debounce window
//! (trailing edge). A failed save leaves the local collection alone, raises a
//! [`GalleryEvent::PersistenceFailed`] and keeps the list around so the next
//! commit or flush retries it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use lodgia_core::{Collection, GalleryError, ImageListStore};

use crate::events::{EventSink, GalleryEvent};

enum SyncCommand {
    Commit(Vec<String>),
    Flush(oneshot::Sender<Result<(), GalleryError>>),
}

pub struct PersistenceSynchronizer {
    tx: mpsc::UnboundedSender<SyncCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PersistenceSynchronizer {
    /// Spawn the background saver for `parent_id`.
    ///
    /// `saved_urls` is the list the store already holds; committing an
    /// identical list is not re-saved.
    pub fn spawn(
        parent_id: impl Into<String>,
        store: Arc<dyn ImageListStore>,
        debounce: Duration,
        saved_urls: Vec<String>,
        events: EventSink,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = SyncWorker {
            parent_id: parent_id.into(),
            store,
            debounce,
            events,
            pending: None,
            last_saved: Some(saved_urls),
        };

        let handle = tokio::spawn(worker.run(rx));

        Self {
            tx,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Schedule the committed URLs of `collection` for saving.
    pub fn commit(&self, collection: &Collection) {
        self.commit_urls(collection.committed_urls());
    }

    pub fn commit_urls(&self, urls: Vec<String>) {
        if self.tx.send(SyncCommand::Commit(urls)).is_err() {
            tracing::warn!("Persistence synchronizer stopped, dropping commit");
        }
    }

    /// Save whatever is pending right now and wait for the outcome.
    pub async fn flush(&self) -> Result<(), GalleryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SyncCommand::Flush(reply_tx))
            .map_err(|_| GalleryError::Internal("persistence synchronizer stopped".to_string()))?;

        reply_rx.await.map_err(|_| {
            GalleryError::Internal("persistence synchronizer dropped flush request".to_string())
        })?
    }

    /// Flush, then stop the background task.
    pub async fn shutdown(&self) -> Result<(), GalleryError> {
        let result = self.flush().await;

        if let Some(handle) = self.worker.lock().await.take() {
            handle.abort();
            let _ = handle.await;
        }

        result
    }
}

struct SyncWorker {
    parent_id: String,
    store: Arc<dyn ImageListStore>,
    debounce: Duration,
    events: EventSink,
    /// Latest list not yet saved (or whose save failed)
    pending: Option<Vec<String>>,
    last_saved: Option<Vec<String>>,
}

impl SyncWorker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<SyncCommand>) {
        tracing::debug!(
            parent_id = %self.parent_id,
            debounce_ms = self.debounce.as_millis() as u64,
            "Persistence synchronizer started"
        );

        while let Some(command) = rx.recv().await {
            match command {
                SyncCommand::Flush(reply) => {
                    let _ = reply.send(self.save_pending().await);
                    continue;
                }
                SyncCommand::Commit(urls) => self.pending = Some(urls),
            }

            // Quiet window: every new commit restarts the timer.
            loop {
                tokio::select! {
                    command = rx.recv() => match command {
                        Some(SyncCommand::Commit(urls)) => self.pending = Some(urls),
                        Some(SyncCommand::Flush(reply)) => {
                            let _ = reply.send(self.save_pending().await);
                            break;
                        }
                        None => {
                            let _ = self.save_pending().await;
                            return;
                        }
                    },
                    _ = tokio::time::sleep(self.debounce) => {
                        let _ = self.save_pending().await;
                        break;
                    }
                }
            }
        }

        // All senders gone: persist the last word before exiting.
        let _ = self.save_pending().await;
        tracing::debug!(parent_id = %self.parent_id, "Persistence synchronizer stopped");
    }

    async fn save_pending(&mut self) -> Result<(), GalleryError> {
        let Some(urls) = self.pending.take() else {
            return Ok(());
        };

        if self.last_saved.as_ref() == Some(&urls) {
            tracing::debug!(
                parent_id = %self.parent_id,
                count = urls.len(),
                "Image list unchanged, skipping save"
            );
            return Ok(());
        }

        let start = Instant::now();
        match self.store.save(&self.parent_id, &urls).await {
            Ok(()) => {
                tracing::info!(
                    parent_id = %self.parent_id,
                    count = urls.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Image list persisted"
                );
                self.events.emit(GalleryEvent::Persisted { urls: urls.clone() });
                self.last_saved = Some(urls);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    parent_id = %self.parent_id,
                    count = urls.len(),
                    error = %e,
                    "Failed to persist image list"
                );
                self.events.emit(GalleryEvent::PersistenceFailed {
                    message: e.to_string(),
                });
                self.pending = Some(urls);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingStore {
        saves: StdMutex<Vec<Vec<String>>>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl ImageListStore for RecordingStore {
        async fn load(&self, _parent_id: &str) -> Result<Vec<String>, GalleryError> {
            Ok(Vec::new())
        }

        async fn save(&self, _parent_id: &str, urls: &[String]) -> Result<(), GalleryError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(GalleryError::Persistence("backend unavailable".to_string()));
            }
            self.saves.lock().unwrap().push(urls.to_vec());
            Ok(())
        }
    }

    fn urls(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| format!("https://cdn/{n}.jpg")).collect()
    }

    fn spawn(store: Arc<RecordingStore>, saved: Vec<String>) -> PersistenceSynchronizer {
        PersistenceSynchronizer::spawn(
            "room-1",
            store,
            Duration::from_millis(400),
            saved,
            EventSink::new(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_commits_coalesce_into_one_save() {
        let store = Arc::new(RecordingStore::default());
        let sync = spawn(store.clone(), Vec::new());

        for i in 0..5 {
            sync.commit_urls(urls(&["a", "b", "c"][..=(i % 3)]));
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        sync.commit_urls(urls(&["c", "a", "b"]));
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let saves = store.saves.lock().unwrap().clone();
        assert_eq!(saves, vec![urls(&["c", "a", "b"])]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_saved_before_quiet_window() {
        let store = Arc::new(RecordingStore::default());
        let sync = spawn(store.clone(), Vec::new());

        sync.commit_urls(urls(&["a"]));
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(store.saves.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.saves.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_list_is_not_resaved() {
        let store = Arc::new(RecordingStore::default());
        let sync = spawn(store.clone(), urls(&["a", "b"]));

        sync.commit_urls(urls(&["a", "b"]));
        sync.flush().await.unwrap();

        assert!(store.saves.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_saves_immediately() {
        let store = Arc::new(RecordingStore::default());
        let sync = spawn(store.clone(), Vec::new());

        sync.commit_urls(urls(&["a"]));
        sync.flush().await.unwrap();

        assert_eq!(store.saves.lock().unwrap().clone(), vec![urls(&["a"])]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_is_retried_by_flush() {
        let store = Arc::new(RecordingStore::default());
        let events = EventSink::new();
        let mut rx = events.subscribe();
        let sync = PersistenceSynchronizer::spawn(
            "room-1",
            store.clone(),
            Duration::from_millis(400),
            Vec::new(),
            events,
        );

        store.fail.store(true, Ordering::SeqCst);
        sync.commit_urls(urls(&["a"]));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(matches!(
            rx.recv().await,
            Ok(GalleryEvent::PersistenceFailed { .. })
        ));

        store.fail.store(false, Ordering::SeqCst);
        sync.flush().await.unwrap();

        assert_eq!(store.saves.lock().unwrap().clone(), vec![urls(&["a"])]);
        assert!(matches!(rx.recv().await, Ok(GalleryEvent::Persisted { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending_commit() {
        let store = Arc::new(RecordingStore::default());
        let sync = spawn(store.clone(), Vec::new());

        sync.commit_urls(urls(&["a", "b"]));
        sync.shutdown().await.unwrap();

        assert_eq!(store.saves.lock().unwrap().clone(), vec![urls(&["a", "b"])]);
        assert!(sync.flush().await.is_err());
    }
}
