//! In-memory collaborators for gallery integration tests.

use async_trait::async_trait;
use lodgia_core::{
    AssetDeleter, AssetUploader, GalleryError, ImageListStore, MediaFile, UploadProgress,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// What the scripted uploader does for a given file name.
#[derive(Debug, Clone)]
pub enum Script {
    Succeed,
    /// Fail this many attempts, then succeed
    FailTimes(usize),
    FailAlways(String),
    /// Succeed after a simulated transfer time, reporting progress on the way
    Delay(Duration),
    /// Block until `ScriptedUploader::release` is called
    Hold,
    /// Never finish
    Hang,
    /// Report success with a blank URL
    EmptyUrl,
}

/// Uploader whose behaviour is scripted per file name. Files without a script succeed.
#[derive(Clone)]
pub struct ScriptedUploader {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    calls: Arc<Mutex<Vec<String>>>,
    failures_so_far: Arc<Mutex<HashMap<String, usize>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    held: Arc<Semaphore>,
}

impl ScriptedUploader {
    pub fn new() -> Self {
        Self {
            scripts: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            failures_so_far: Arc::new(Mutex::new(HashMap::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            held: Arc::new(Semaphore::new(0)),
        }
    }

    pub fn script(self, file_name: &str, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(file_name.to_string(), script);
        self
    }

    /// Let `count` held uploads finish.
    pub fn release(&self, count: usize) {
        self.held.add_permits(count);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn url_for(parent_id: &str, file_name: &str) -> String {
        format!("https://cdn.test/{}/{}", parent_id, file_name)
    }

    async fn run_script(
        &self,
        parent_id: &str,
        file: &MediaFile,
        progress: &UploadProgress,
    ) -> Result<String, GalleryError> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(&file.name)
            .cloned()
            .unwrap_or(Script::Succeed);
        let url = Self::url_for(parent_id, &file.name);

        match script {
            Script::Succeed => {
                progress.report_bytes(file.byte_size(), file.byte_size());
                Ok(url)
            }
            Script::FailTimes(times) => {
                let mut failures = self.failures_so_far.lock().unwrap();
                let seen = failures.entry(file.name.clone()).or_insert(0);
                if *seen < times {
                    *seen += 1;
                    Err(GalleryError::Upload(format!("connection reset ({})", seen)))
                } else {
                    Ok(url)
                }
            }
            Script::FailAlways(message) => Err(GalleryError::Upload(message)),
            Script::Delay(duration) => {
                let total = file.byte_size();
                progress.report_bytes(total / 2, total);
                tokio::time::sleep(duration).await;
                progress.report_bytes(total, total);
                Ok(url)
            }
            Script::Hold => {
                progress.report(10);
                let permit = self
                    .held
                    .acquire()
                    .await
                    .map_err(|e| GalleryError::Upload(e.to_string()))?;
                permit.forget();
                Ok(url)
            }
            Script::Hang => {
                std::future::pending::<()>().await;
                Ok(url)
            }
            Script::EmptyUrl => Ok(String::new()),
        }
    }
}

#[async_trait]
impl AssetUploader for ScriptedUploader {
    async fn upload(
        &self,
        parent_id: &str,
        file: &MediaFile,
        progress: UploadProgress,
    ) -> Result<String, GalleryError> {
        self.calls.lock().unwrap().push(file.name.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = self.run_script(parent_id, file, &progress).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// List store that records every save and can be told to fail.
#[derive(Clone, Default)]
pub struct RecordingListStore {
    lists: Arc<Mutex<HashMap<String, Vec<String>>>>,
    saves: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    fail_saves: Arc<AtomicBool>,
}

impl RecordingListStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(self, parent_id: &str, urls: &[String]) -> Self {
        self.lists
            .lock()
            .unwrap()
            .insert(parent_id.to_string(), urls.to_vec());
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_saves.store(failing, Ordering::SeqCst);
    }

    pub fn saves(&self) -> Vec<Vec<String>> {
        self.saves
            .lock()
            .unwrap()
            .iter()
            .map(|(_, urls)| urls.clone())
            .collect()
    }

    pub fn stored(&self, parent_id: &str) -> Option<Vec<String>> {
        self.lists.lock().unwrap().get(parent_id).cloned()
    }
}

#[async_trait]
impl ImageListStore for RecordingListStore {
    async fn load(&self, parent_id: &str) -> Result<Vec<String>, GalleryError> {
        Ok(self.stored(parent_id).unwrap_or_default())
    }

    async fn save(&self, parent_id: &str, ordered_urls: &[String]) -> Result<(), GalleryError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(GalleryError::Persistence(
                "listing service unavailable".to_string(),
            ));
        }
        self.saves
            .lock()
            .unwrap()
            .push((parent_id.to_string(), ordered_urls.to_vec()));
        self.lists
            .lock()
            .unwrap()
            .insert(parent_id.to_string(), ordered_urls.to_vec());
        Ok(())
    }
}

/// Deleter that records requested URLs.
#[derive(Clone, Default)]
pub struct RecordingDeleter {
    deleted: Arc<Mutex<Vec<String>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingDeleter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let deleter = Self::default();
        deleter.fail.store(true, Ordering::SeqCst);
        deleter
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetDeleter for RecordingDeleter {
    async fn delete_asset(&self, url: &str) -> Result<(), GalleryError> {
        self.deleted.lock().unwrap().push(url.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(GalleryError::Deletion(format!("cannot delete {}", url)));
        }
        Ok(())
    }
}
