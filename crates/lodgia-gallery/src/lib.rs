//! Lodgia Gallery
//!
//! The ordered photo gallery of one rental property or room: admission,
//! concurrent uploads, pure collection edits and debounced persistence of the
//! committed image list, all serialized through a single [`Gallery`] owner.

pub mod editor;
pub mod events;
pub mod gallery;
pub mod sync;
pub mod timeline;
pub mod upload_queue;

pub use events::{EventSink, GalleryEvent};
pub use gallery::{Collaborators, Gallery, Selection};
pub use sync::PersistenceSynchronizer;
pub use timeline::Timeline;
pub use upload_queue::{BatchSummary, UploadBatch, UploadQueueManager};
