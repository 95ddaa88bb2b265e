//! Data models for the gallery
//!
//! This module contains the value types shared by every Lodgia component:
//! the gallery slot, the ordered collection of slots, and the raw file handed
//! over by the capture surface.

mod collection;
mod media_file;
mod media_item;

// Re-export all models for convenient imports
pub use collection::*;
pub use media_file::*;
pub use media_item::*;
