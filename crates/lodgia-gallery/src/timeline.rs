//! Single-owner timeline of gallery snapshots.
//!
//! All mutations funnel through [`Timeline::apply`] or [`Timeline::merge`],
//! which run one pure editor call while holding the channel's write lock. Two
//! mutations can therefore never interleave, and readers only ever see whole
//! snapshots.

use std::sync::Arc;

use tokio::sync::watch;

use lodgia_core::{Collection, GalleryError};

#[derive(Debug, Clone)]
pub struct Timeline {
    tx: Arc<watch::Sender<Collection>>,
}

impl Timeline {
    pub fn new(initial: Collection) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Current snapshot (cheap clone of at most a few dozen items).
    pub fn snapshot(&self) -> Collection {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Collection> {
        self.tx.subscribe()
    }

    /// Run `f` against the current snapshot while holding the read lock.
    ///
    /// No mutation can land while `f` runs, so anything `f` hands off (such as
    /// a persistence commit) is ordered after every earlier mutation and
    /// before every later one.
    pub fn with_current<R>(&self, f: impl FnOnce(&Collection) -> R) -> R {
        let current = self.tx.borrow();
        f(&current)
    }

    /// Run a fallible operation that produces the next collection plus a value.
    /// Subscribers are notified only when the collection actually changed.
    pub fn apply<T, F>(&self, op: F) -> Result<T, GalleryError>
    where
        F: FnOnce(&Collection) -> Result<(Collection, T), GalleryError>,
    {
        let mut outcome = Err(GalleryError::Internal(
            "timeline operation did not run".to_string(),
        ));

        self.tx.send_if_modified(|current| match op(current) {
            Ok((next, value)) => {
                let changed = next != *current;
                *current = next;
                outcome = Ok(value);
                changed
            }
            Err(e) => {
                outcome = Err(e);
                false
            }
        });

        outcome
    }

    /// Run an upload merge; `None` from `op` means the callback was stale.
    /// Returns whether the merge landed.
    pub fn merge<F>(&self, op: F) -> bool
    where
        F: FnOnce(&Collection) -> Option<Collection>,
    {
        self.tx.send_if_modified(|current| match op(current) {
            Some(next) => {
                *current = next;
                true
            }
            None => false,
        })
    }
}
