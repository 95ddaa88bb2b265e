//! Shared helpers for the `lodgia` command-line tool.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use lodgia_core::models::mime_type_from_name;
use lodgia_core::{Collection, GalleryConfig, MediaFile, MediaItemId};
use lodgia_gallery::{Collaborators, Gallery};
use lodgia_storage::{create_list_store, create_storage, StorageAssets};
use serde::Serialize;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Fill in local storage locations the environment left unset, under `data_dir`.
///
/// `data_dir` is made absolute first: a relative path inside a `file://` URL
/// would be read as a host name.
pub fn apply_data_dir(config: &mut GalleryConfig, data_dir: &Path) {
    let data_dir = std::path::absolute(data_dir).unwrap_or_else(|_| data_dir.to_path_buf());
    if config.local_storage_path.is_none() {
        let media = data_dir.join("media");
        config.local_storage_base_url = config
            .local_storage_base_url
            .take()
            .or_else(|| Some(format!("file://{}", media.display())));
        config.local_storage_path = Some(media.display().to_string());
    }
    if config.image_list_path.is_none() {
        config.image_list_path = Some(data_dir.join("lists").display().to_string());
    }
}

/// Load the gallery of `parent_id` backed by the configured local stores.
pub async fn open_gallery(parent_id: &str, config: &GalleryConfig) -> anyhow::Result<Gallery> {
    let storage = create_storage(config)
        .await
        .context("Failed to open photo storage")?;
    let list_store = create_list_store(config)
        .await
        .context("Failed to open image list store")?;

    let assets = Arc::new(StorageAssets::new(storage));
    let collaborators =
        Collaborators::new(assets.clone(), Arc::new(list_store)).with_deleter(assets);

    Gallery::load(parent_id, collaborators, config)
        .await
        .with_context(|| format!("Failed to load gallery for '{}'", parent_id))
}

/// Read a photo from disk, guessing its content type from the extension.
pub async fn read_media_file(path: &Path) -> anyhow::Result<MediaFile> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = mime_type_from_name(&name);
    Ok(MediaFile::new(name, mime_type, data))
}

/// Id of the item shown at `index` (0-based) in the current listing.
pub fn item_at(collection: &Collection, index: usize) -> anyhow::Result<MediaItemId> {
    collection
        .at(index)
        .map(|item| item.id())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No photo at position {} (gallery has {})",
                index,
                collection.len()
            )
        })
}

#[derive(Debug, Serialize)]
pub struct ListEntry {
    pub position: usize,
    pub id: MediaItemId,
    pub primary: bool,
    pub state: String,
    pub name: Option<String>,
    pub url: Option<String>,
    pub error: Option<String>,
}

pub fn list_entries(collection: &Collection) -> Vec<ListEntry> {
    collection
        .iter()
        .enumerate()
        .map(|(position, item)| ListEntry {
            position,
            id: item.id(),
            primary: item.is_primary(),
            state: item.upload_state().to_string(),
            name: item.display_name().map(str::to_string),
            url: item.source_url().map(str::to_string),
            error: item.error_message().map(str::to_string),
        })
        .collect()
}

/// Plain-text listing, one photo per line.
pub fn render_table(collection: &Collection) -> String {
    if collection.is_empty() {
        return "(no photos)".to_string();
    }

    let mut out = format!("{:<4} {:<3} {:<10} {:<32} {}\n", "#", "", "STATE", "NAME", "URL");
    for entry in list_entries(collection) {
        let detail = entry.url.or(entry.error).unwrap_or_default();
        out.push_str(&format!(
            "{:<4} {:<3} {:<10} {:<32} {}\n",
            entry.position,
            if entry.primary { "*" } else { "" },
            entry.state,
            truncate_string(entry.name.as_deref().unwrap_or("-"), 32),
            detail
        ));
    }
    out
}
