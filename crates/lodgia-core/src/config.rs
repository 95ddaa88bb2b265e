//! Configuration module
//!
//! This module provides the gallery configuration: admission limits, upload
//! concurrency, persistence debouncing, and the locations used by the bundled
//! local stores.

use std::env;
use std::time::Duration;

// Common constants
const MAX_IMAGES: usize = 20;
const MAX_FILE_SIZE_MB: u64 = 10;
const PERSIST_DEBOUNCE_MS: u64 = 400;
const MAX_CONCURRENT_UPLOADS: usize = 0;
const UPLOAD_TIMEOUT_SECS: u64 = 0;
const ALLOWED_CONTENT_TYPES: &str = "image/jpeg,image/png,image/gif,image/webp";

/// Gallery configuration
#[derive(Clone, Debug)]
pub struct GalleryConfig {
    pub environment: String,
    /// Maximum number of photos one parent entity may hold
    pub max_images: usize,
    pub max_file_size_bytes: u64,
    pub allowed_content_types: Vec<String>,
    /// Quiet window before the latest image list is saved
    pub persist_debounce_ms: u64,
    /// Simultaneous uploads per gallery. 0 = unlimited.
    pub max_concurrent_uploads: usize,
    /// Per-upload timeout. 0 = left to the upload collaborator.
    pub upload_timeout_secs: u64,
    // Local storage configuration
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    /// Directory holding one JSON image list per parent entity
    pub image_list_path: Option<String>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            max_images: MAX_IMAGES,
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            allowed_content_types: split_list(ALLOWED_CONTENT_TYPES),
            persist_debounce_ms: PERSIST_DEBOUNCE_MS,
            max_concurrent_uploads: MAX_CONCURRENT_UPLOADS,
            upload_timeout_secs: UPLOAD_TIMEOUT_SECS,
            local_storage_path: None,
            local_storage_base_url: None,
            image_list_path: None,
        }
    }
}

impl GalleryConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let config = GalleryConfig {
            environment,
            max_images: env::var("GALLERY_MAX_IMAGES")
                .unwrap_or_else(|_| MAX_IMAGES.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("GALLERY_MAX_IMAGES must be a valid number"))?,
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_content_types: split_list(
                &env::var("ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|_| ALLOWED_CONTENT_TYPES.to_string()),
            ),
            persist_debounce_ms: env::var("PERSIST_DEBOUNCE_MS")
                .unwrap_or_else(|_| PERSIST_DEBOUNCE_MS.to_string())
                .parse()
                .unwrap_or(PERSIST_DEBOUNCE_MS),
            max_concurrent_uploads: env::var("MAX_CONCURRENT_UPLOADS")
                .unwrap_or_else(|_| MAX_CONCURRENT_UPLOADS.to_string())
                .parse()
                .unwrap_or(MAX_CONCURRENT_UPLOADS),
            upload_timeout_secs: env::var("UPLOAD_TIMEOUT_SECS")
                .unwrap_or_else(|_| UPLOAD_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(UPLOAD_TIMEOUT_SECS),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok().filter(|s| !s.is_empty()),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            image_list_path: env::var("IMAGE_LIST_PATH").ok().filter(|s| !s.is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_images == 0 {
            return Err(anyhow::anyhow!("GALLERY_MAX_IMAGES must be at least 1"));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be at least 1"));
        }

        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_CONTENT_TYPES must list at least one content type"
            ));
        }

        if let Some(bad) = self
            .allowed_content_types
            .iter()
            .find(|ct| !ct.starts_with("image/"))
        {
            return Err(anyhow::anyhow!(
                "ALLOWED_CONTENT_TYPES may only contain image types, found '{}'",
                bad
            ));
        }

        if self.local_storage_path.is_some() != self.local_storage_base_url.is_some() {
            return Err(anyhow::anyhow!(
                "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set together"
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }

    pub fn upload_timeout(&self) -> Option<Duration> {
        (self.upload_timeout_secs > 0).then(|| Duration::from_secs(self.upload_timeout_secs))
    }

    pub fn upload_concurrency_limit(&self) -> Option<usize> {
        (self.max_concurrent_uploads > 0).then_some(self.max_concurrent_uploads)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
