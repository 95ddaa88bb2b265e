//! Test helpers: gallery fixtures and mock collaborators.
//!
//! Run from workspace root: `cargo test -p lodgia-gallery`.

#![allow(dead_code)]

pub mod mocks;

use lodgia_core::{GalleryConfig, MediaFile};
use lodgia_gallery::{Collaborators, Gallery, GalleryEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

pub use mocks::{RecordingDeleter, RecordingListStore, Script, ScriptedUploader};

pub const PARENT_ID: &str = "room-42";

pub struct TestGallery {
    pub gallery: Gallery,
    pub uploader: ScriptedUploader,
    pub store: RecordingListStore,
    pub deleter: RecordingDeleter,
}

pub fn test_config() -> GalleryConfig {
    GalleryConfig {
        max_images: 20,
        persist_debounce_ms: 400,
        ..GalleryConfig::default()
    }
}

pub fn jpeg(name: &str) -> MediaFile {
    MediaFile::new(name, "image/jpeg", vec![0xFFu8; 1024])
}

pub fn committed(names: &[&str]) -> Vec<String> {
    names
        .iter()
        .map(|name| ScriptedUploader::url_for(PARENT_ID, name))
        .collect()
}

/// Gallery seeded with `existing` uploaded photos (by file name).
pub async fn setup_gallery(
    existing: &[&str],
    uploader: ScriptedUploader,
    config: GalleryConfig,
) -> TestGallery {
    setup_gallery_with(existing, uploader, RecordingDeleter::new(), config).await
}

pub async fn setup_gallery_with(
    existing: &[&str],
    uploader: ScriptedUploader,
    deleter: RecordingDeleter,
    config: GalleryConfig,
) -> TestGallery {
    let store = RecordingListStore::new().with_list(PARENT_ID, &committed(existing));
    let collaborators = Collaborators::new(Arc::new(uploader.clone()), Arc::new(store.clone()))
        .with_deleter(Arc::new(deleter.clone()));

    let gallery = Gallery::load(PARENT_ID, collaborators, &config)
        .await
        .expect("gallery should load");

    TestGallery {
        gallery,
        uploader,
        store,
        deleter,
    }
}

/// Names of the items in position order.
pub fn names(gallery: &Gallery) -> Vec<String> {
    gallery
        .snapshot()
        .iter()
        .map(|item| item.display_name().unwrap_or_default().to_string())
        .collect()
}

/// Let spawned tasks and the debounce window run out (paused clock).
pub async fn settle() {
    tokio::time::sleep(Duration::from_secs(2)).await;
}

/// Everything currently buffered on an event receiver.
pub fn drain(rx: &mut broadcast::Receiver<GalleryEvent>) -> Vec<GalleryEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
