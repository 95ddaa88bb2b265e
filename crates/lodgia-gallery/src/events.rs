//! Operator-facing notifications.
//!
//! Every failure the gallery can hit is reported here instead of being
//! returned to a caller that has long moved on. Delivery is best effort: a
//! lagging or absent subscriber never slows the gallery down.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use lodgia_core::{MediaItemId, Rejection};

/// Buffered notifications per subscriber before the oldest are dropped
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GalleryEvent {
    /// A selected file never entered the gallery.
    FileRejected {
        file_name: String,
        reason: String,
        capacity: bool,
    },
    UploadFailed {
        item_id: MediaItemId,
        attempt: u32,
        message: String,
    },
    /// Every upload of one selection has settled.
    BatchFinished {
        batch_id: Uuid,
        uploaded: usize,
        failed: usize,
    },
    Persisted {
        urls: Vec<String>,
    },
    PersistenceFailed {
        message: String,
    },
    DeletionFailed {
        url: String,
        message: String,
    },
}

impl GalleryEvent {
    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            GalleryEvent::Persisted { .. } | GalleryEvent::BatchFinished { .. }
        )
    }
}

impl From<&Rejection> for GalleryEvent {
    fn from(rejection: &Rejection) -> Self {
        GalleryEvent::FileRejected {
            file_name: rejection.file_name.clone(),
            reason: rejection.reason.to_string(),
            capacity: rejection.reason.is_capacity(),
        }
    }
}

/// Cloneable sending half shared by the queue, the synchronizer and the gallery.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: broadcast::Sender<GalleryEvent>,
}

impl EventSink {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn emit(&self, event: GalleryEvent) {
        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GalleryEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodgia_core::ValidationError;

    #[test]
    fn test_rejection_becomes_event() {
        let rejection = Rejection {
            file_name: "big.jpg".to_string(),
            reason: ValidationError::CapacityExceeded { max: 20 },
        };

        match GalleryEvent::from(&rejection) {
            GalleryEvent::FileRejected {
                file_name,
                capacity,
                ..
            } => {
                assert_eq!(file_name, "big.jpg");
                assert!(capacity);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = GalleryEvent::PersistenceFailed {
            message: "disk full".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "persistence_failed");
        assert_eq!(json["message"], "disk full");
        assert!(event.is_failure());
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_does_not_fail() {
        let sink = EventSink::new();
        sink.emit(GalleryEvent::Persisted { urls: vec![] });

        let mut rx = sink.subscribe();
        sink.emit(GalleryEvent::Persisted {
            urls: vec!["https://cdn/a.jpg".to_string()],
        });
        assert!(matches!(rx.recv().await, Ok(GalleryEvent::Persisted { .. })));
    }
}
