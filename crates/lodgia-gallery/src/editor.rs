//! Pure operations over a gallery collection.
//!
//! Every function takes the current collection by reference and returns a new
//! one, so readers holding a snapshot never observe a half-applied edit. Items
//! are always addressed by their stable id; positional indices are only
//! accepted from the drag gesture, which reports them against the snapshot it
//! rendered.
//!
//! Primary status belongs to position 0. Operations that change which item
//! sits at position 0 re-designate it; operations that leave position 0 alone
//! never touch `is_primary`.

use lodgia_core::{Collection, GalleryError, MediaItem, MediaItemId, UploadState};

/// Move the item at `source` so it ends up at `target`.
///
/// Dragging an item into slot 0, or dragging the primary item out of it, makes
/// the new occupant of slot 0 the primary item.
pub fn reorder(
    collection: &Collection,
    source: usize,
    target: usize,
) -> Result<Collection, GalleryError> {
    let len = collection.len();
    for index in [source, target] {
        if index >= len {
            return Err(GalleryError::IndexOutOfRange { index, len });
        }
    }

    let mut next = collection.clone();
    if source == target {
        return Ok(next);
    }

    let items = next.items_mut();
    let item = items.remove(source);
    items.insert(target, item);
    next.normalize_primary();
    Ok(next)
}

/// Move `id` to position 0 and make it the only primary item. Idempotent.
pub fn set_primary(collection: &Collection, id: MediaItemId) -> Result<Collection, GalleryError> {
    let position = collection
        .position(id)
        .ok_or(GalleryError::ItemNotFound(id))?;

    let mut next = collection.clone();
    let items = next.items_mut();
    let item = items.remove(position);
    items.insert(0, item);
    next.normalize_primary();
    Ok(next)
}

/// Delete `id`, promoting the new first item if the primary was removed.
/// Returns the removed item so callers can clean up its remote bytes.
pub fn remove(
    collection: &Collection,
    id: MediaItemId,
) -> Result<(Collection, MediaItem), GalleryError> {
    let position = collection
        .position(id)
        .ok_or(GalleryError::ItemNotFound(id))?;

    let mut next = collection.clone();
    let removed = next.items_mut().remove(position);
    next.normalize_primary();
    Ok((next, removed))
}

/// Change the display name of `id`; nothing else about the item moves.
pub fn rename(
    collection: &Collection,
    id: MediaItemId,
    name: &str,
) -> Result<Collection, GalleryError> {
    let mut next = collection.clone();
    let item = next.get_mut(id).ok_or(GalleryError::ItemNotFound(id))?;
    item.rename(name);
    Ok(next)
}

/// Append placeholders for freshly admitted files.
///
/// Refuses the whole set if it would push the collection past `max_items`;
/// the validation gate normally prevents that before we get here.
pub fn append_pending(
    collection: &Collection,
    placeholders: Vec<MediaItem>,
    max_items: usize,
) -> Result<Collection, GalleryError> {
    if collection.len() + placeholders.len() > max_items {
        return Err(GalleryError::CapacityExceeded { max: max_items });
    }

    let mut next = collection.clone();
    next.items_mut().extend(placeholders);
    next.normalize_primary();
    Ok(next)
}

/// Pending → Uploading for the given attempt.
pub fn begin_upload(collection: &Collection, id: MediaItemId, attempt: u32) -> Option<Collection> {
    merge(collection, id, attempt, |item| item.begin_upload())
}

pub fn record_progress(
    collection: &Collection,
    id: MediaItemId,
    attempt: u32,
    percent: u8,
) -> Option<Collection> {
    let current = collection.get(id)?;
    if current.attempt() != attempt
        || current.upload_state() != UploadState::Uploading
        || current.upload_progress() >= percent.min(100)
    {
        return None;
    }
    merge(collection, id, attempt, |item| item.record_progress(percent))
}

/// Uploading → Uploaded for the given attempt.
pub fn complete_upload(
    collection: &Collection,
    id: MediaItemId,
    attempt: u32,
    url: String,
) -> Option<Collection> {
    merge(collection, id, attempt, |item| item.complete_upload(url))
}

/// Uploading → Failed for the given attempt.
pub fn fail_upload(
    collection: &Collection,
    id: MediaItemId,
    attempt: u32,
    message: String,
) -> Option<Collection> {
    merge(collection, id, attempt, |item| item.fail_upload(message))
}

/// Open a new attempt on a failed slot. Returns the new attempt number.
pub fn restart_upload(
    collection: &Collection,
    id: MediaItemId,
) -> Result<(Collection, u32), GalleryError> {
    let mut next = collection.clone();
    let item = next.get_mut(id).ok_or(GalleryError::ItemNotFound(id))?;
    let attempt = item.restart_upload()?;
    Ok((next, attempt))
}

/// Drop a failed slot the operator gave up on.
pub fn dismiss(
    collection: &Collection,
    id: MediaItemId,
) -> Result<(Collection, MediaItem), GalleryError> {
    let item = collection.get(id).ok_or(GalleryError::ItemNotFound(id))?;
    if item.upload_state() != UploadState::Failed {
        return Err(GalleryError::InvalidInput(format!(
            "only failed uploads can be dismissed, item {} is {}",
            id,
            item.upload_state()
        )));
    }
    remove(collection, id)
}

/// Apply an upload callback to `id`, or return `None` when the callback is
/// stale: the item was removed, a newer attempt superseded this one, or the
/// transition is no longer legal.
fn merge<F>(collection: &Collection, id: MediaItemId, attempt: u32, apply: F) -> Option<Collection>
where
    F: FnOnce(&mut MediaItem) -> Result<(), GalleryError>,
{
    let mut next = collection.clone();
    let item = next.get_mut(id)?;
    if item.attempt() != attempt {
        tracing::debug!(
            item_id = %id,
            attempt,
            current_attempt = item.attempt(),
            "Ignoring callback for superseded upload attempt"
        );
        return None;
    }

    if let Err(e) = apply(item) {
        tracing::warn!(item_id = %id, attempt, error = %e, "Ignoring illegal upload transition");
        return None;
    }

    Some(next)
}
