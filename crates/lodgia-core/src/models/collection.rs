use serde::{Deserialize, Serialize};

use super::media_item::{MediaItem, MediaItemId, UploadState};

/// Ordered gallery contents. Position 0 holds the primary item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    items: Vec<MediaItem>,
}

/// Number of items in each upload state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub pending: usize,
    pub uploading: usize,
    pub uploaded: usize,
    pub failed: usize,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from the URLs already committed on the parent entity.
    /// The first URL becomes the primary item.
    pub fn from_committed_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_items(urls.into_iter().map(MediaItem::uploaded).collect())
    }

    /// Wrap items in their given order, designating position 0 as primary.
    pub fn from_items(items: Vec<MediaItem>) -> Self {
        let mut collection = Self { items };
        collection.normalize_primary();
        collection
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MediaItem> {
        self.items.iter()
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn get(&self, id: MediaItemId) -> Option<&MediaItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn get_mut(&mut self, id: MediaItemId) -> Option<&mut MediaItem> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    pub fn position(&self, id: MediaItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn at(&self, index: usize) -> Option<&MediaItem> {
        self.items.get(index)
    }

    pub fn primary(&self) -> Option<&MediaItem> {
        self.items.iter().find(|item| item.is_primary())
    }

    /// Ordered URLs of uploaded items: the list the parent entity should hold.
    pub fn committed_urls(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.is_uploaded())
            .filter_map(|item| item.source_url().map(str::to_string))
            .collect()
    }

    pub fn counts(&self) -> StateCounts {
        self.items
            .iter()
            .fold(StateCounts::default(), |mut counts, item| {
                match item.upload_state() {
                    UploadState::Pending => counts.pending += 1,
                    UploadState::Uploading => counts.uploading += 1,
                    UploadState::Uploaded => counts.uploaded += 1,
                    UploadState::Failed => counts.failed += 1,
                }
                counts
            })
    }

    pub fn ids(&self) -> Vec<MediaItemId> {
        self.items.iter().map(MediaItem::id).collect()
    }

    pub fn items_mut(&mut self) -> &mut Vec<MediaItem> {
        &mut self.items
    }

    /// Make the item at position 0 the only primary item.
    pub fn normalize_primary(&mut self) {
        for (index, item) in self.items.iter_mut().enumerate() {
            item.set_primary(index == 0);
        }
    }

    /// True when the primary invariant holds: no primary when empty, otherwise
    /// exactly one, at position 0.
    pub fn primary_invariant_holds(&self) -> bool {
        let primaries = self.items.iter().filter(|item| item.is_primary()).count();
        match self.items.first() {
            None => primaries == 0,
            Some(first) => primaries == 1 && first.is_primary(),
        }
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a MediaItem;
    type IntoIter = std::slice::Iter<'a, MediaItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
