use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GalleryError;

/// Stable identifier of one gallery slot for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaItemId(Uuid);

impl MediaItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MediaItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for MediaItemId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for MediaItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Display for MediaItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Upload lifecycle of one attempt.
///
/// Pending → Uploading → {Uploaded | Failed}. Both outcomes are terminal for the
/// attempt; an operator retry opens a new attempt that starts over at Pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadState {
    Pending,
    Uploading,
    Uploaded,
    Failed,
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Uploaded | UploadState::Failed)
    }

    /// Whether moving from `self` to `next` is a legal step within one attempt
    pub fn can_transition_to(&self, next: UploadState) -> bool {
        matches!(
            (self, next),
            (UploadState::Pending, UploadState::Uploading)
                | (UploadState::Uploading, UploadState::Uploaded)
                | (UploadState::Uploading, UploadState::Failed)
        )
    }
}

impl Display for UploadState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadState::Pending => write!(f, "pending"),
            UploadState::Uploading => write!(f, "uploading"),
            UploadState::Uploaded => write!(f, "uploaded"),
            UploadState::Failed => write!(f, "failed"),
        }
    }
}

/// One asset slot in a gallery.
///
/// Fields are private so the slot can only move through legal upload
/// transitions; `source_url` is `Some` exactly when the state is `Uploaded`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    id: MediaItemId,
    source_url: Option<String>,
    display_name: Option<String>,
    byte_size: u64,
    mime_type: String,
    is_primary: bool,
    upload_state: UploadState,
    upload_progress: u8,
    error_message: Option<String>,
    attempt: u32,
}

impl MediaItem {
    /// Placeholder for a freshly admitted file, before any network activity.
    pub fn pending(display_name: Option<String>, byte_size: u64, mime_type: String) -> Self {
        Self {
            id: MediaItemId::new(),
            source_url: None,
            display_name,
            byte_size,
            mime_type,
            is_primary: false,
            upload_state: UploadState::Pending,
            upload_progress: 0,
            error_message: None,
            attempt: 1,
        }
    }

    /// Slot for a URL already committed on the parent entity.
    pub fn uploaded(url: impl Into<String>) -> Self {
        let url = url.into();
        let display_name = display_name_from_url(&url);
        let mime_type = mime_type_from_name(&url).to_string();
        Self {
            id: MediaItemId::new(),
            source_url: Some(url),
            display_name,
            byte_size: 0,
            mime_type,
            is_primary: false,
            upload_state: UploadState::Uploaded,
            upload_progress: 100,
            error_message: None,
            attempt: 1,
        }
    }

    pub fn id(&self) -> MediaItemId {
        self.id
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn upload_state(&self) -> UploadState {
        self.upload_state
    }

    pub fn upload_progress(&self) -> u8 {
        self.upload_progress
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn is_uploaded(&self) -> bool {
        self.upload_state == UploadState::Uploaded
    }

    pub fn set_primary(&mut self, is_primary: bool) {
        self.is_primary = is_primary;
    }

    /// Blank or whitespace-only names clear the display name.
    pub fn rename(&mut self, name: &str) {
        let trimmed = name.trim();
        self.display_name = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    pub fn begin_upload(&mut self) -> Result<(), GalleryError> {
        self.transition(UploadState::Uploading)?;
        self.upload_progress = 0;
        Ok(())
    }

    /// Progress never moves backwards within an attempt.
    pub fn record_progress(&mut self, percent: u8) -> Result<(), GalleryError> {
        if self.upload_state != UploadState::Uploading {
            return Err(GalleryError::InvalidTransition {
                from: self.upload_state,
                to: UploadState::Uploading,
            });
        }
        self.upload_progress = self.upload_progress.max(percent.min(100));
        Ok(())
    }

    pub fn complete_upload(&mut self, url: String) -> Result<(), GalleryError> {
        if url.trim().is_empty() {
            return Err(GalleryError::Upload(
                "upload returned an empty URL".to_string(),
            ));
        }
        self.transition(UploadState::Uploaded)?;
        self.source_url = Some(url);
        self.upload_progress = 100;
        self.error_message = None;
        Ok(())
    }

    pub fn fail_upload(&mut self, message: String) -> Result<(), GalleryError> {
        self.transition(UploadState::Failed)?;
        self.error_message = Some(message);
        Ok(())
    }

    /// Open a new attempt on a failed slot. Returns the new attempt number.
    pub fn restart_upload(&mut self) -> Result<u32, GalleryError> {
        if self.upload_state != UploadState::Failed {
            return Err(GalleryError::InvalidTransition {
                from: self.upload_state,
                to: UploadState::Pending,
            });
        }
        self.attempt += 1;
        self.upload_state = UploadState::Pending;
        self.upload_progress = 0;
        self.error_message = None;
        Ok(self.attempt)
    }

    fn transition(&mut self, next: UploadState) -> Result<(), GalleryError> {
        if !self.upload_state.can_transition_to(next) {
            return Err(GalleryError::InvalidTransition {
                from: self.upload_state,
                to: next,
            });
        }
        self.upload_state = next;
        Ok(())
    }
}

fn display_name_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| segment.to_string())
        })
}

/// Best-effort content type from a file name or URL extension.
pub fn mime_type_from_name(name: &str) -> &'static str {
    let path = name.split(['?', '#']).next().unwrap_or(name);
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "heic" => "image/heic",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploading_item() -> MediaItem {
        let mut item = MediaItem::pending(Some("porch.jpg".to_string()), 2048, "image/jpeg".into());
        item.begin_upload().unwrap();
        item
    }

    #[test]
    fn test_pending_item_has_no_url() {
        let item = MediaItem::pending(None, 10, "image/png".to_string());
        assert_eq!(item.upload_state(), UploadState::Pending);
        assert!(item.source_url().is_none());
        assert_eq!(item.attempt(), 1);
    }

    #[test]
    fn test_uploaded_item_from_url() {
        let item = MediaItem::uploaded("https://cdn.example.com/media/Living%20Room.webp?v=2");
        assert!(item.is_uploaded());
        assert_eq!(item.display_name(), Some("Living Room.webp"));
        assert_eq!(item.mime_type(), "image/webp");
        assert_eq!(item.upload_progress(), 100);
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut item = uploading_item();
        item.record_progress(40).unwrap();
        item.complete_upload("https://cdn/x.jpg".to_string()).unwrap();
        assert_eq!(item.upload_state(), UploadState::Uploaded);
        assert_eq!(item.source_url(), Some("https://cdn/x.jpg"));
        assert_eq!(item.upload_progress(), 100);
    }

    #[test]
    fn test_cannot_skip_uploading() {
        let mut item = MediaItem::pending(None, 1, "image/png".to_string());
        assert!(matches!(
            item.complete_upload("https://cdn/x.png".to_string()),
            Err(GalleryError::InvalidTransition { .. })
        ));
        assert!(item.source_url().is_none());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut item = uploading_item();
        item.fail_upload("timeout".to_string()).unwrap();
        assert!(item.begin_upload().is_err());
        assert!(item.complete_upload("https://cdn/x.jpg".to_string()).is_err());
        assert_eq!(item.error_message(), Some("timeout"));
    }

    #[test]
    fn test_empty_url_is_not_a_success() {
        let mut item = uploading_item();
        assert!(item.complete_upload("  ".to_string()).is_err());
        assert_eq!(item.upload_state(), UploadState::Uploading);
    }

    #[test]
    fn test_progress_is_monotonic_and_clamped() {
        let mut item = uploading_item();
        item.record_progress(60).unwrap();
        item.record_progress(30).unwrap();
        assert_eq!(item.upload_progress(), 60);
        item.record_progress(250).unwrap();
        assert_eq!(item.upload_progress(), 100);
    }

    #[test]
    fn test_restart_opens_new_attempt() {
        let mut item = uploading_item();
        item.fail_upload("boom".to_string()).unwrap();
        assert_eq!(item.restart_upload().unwrap(), 2);
        assert_eq!(item.upload_state(), UploadState::Pending);
        assert!(item.error_message().is_none());

        let mut uploaded = MediaItem::uploaded("https://cdn/a.jpg");
        assert!(uploaded.restart_upload().is_err());
    }

    #[test]
    fn test_rename_trims_and_clears() {
        let mut item = MediaItem::uploaded("https://cdn/a.jpg");
        item.rename("  Kitchen  ");
        assert_eq!(item.display_name(), Some("Kitchen"));
        item.rename("   ");
        assert_eq!(item.display_name(), None);
    }
}
