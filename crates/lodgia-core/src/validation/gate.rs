//! Admission of proposed file batches.
//!
//! The gate is pure and synchronous: it decides which files may enter a gallery
//! before any placeholder or upload exists. Files that pass the per-file checks
//! are admitted first-come-first-served until the gallery is full; everything
//! after that is rejected outright.

use crate::config::GalleryConfig;
use crate::models::MediaFile;

use super::validator::{ImageValidator, ValidationError};

/// A file refused by the gate, with the reason to show the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub file_name: String,
    pub reason: ValidationError,
}

/// Outcome of one admission decision.
#[derive(Debug, Clone, Default)]
pub struct Admission {
    pub admitted: Vec<MediaFile>,
    pub rejected: Vec<Rejection>,
}

impl Admission {
    pub fn capacity_rejections(&self) -> usize {
        self.rejected
            .iter()
            .filter(|rejection| rejection.reason.is_capacity())
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct ValidationGate {
    validator: ImageValidator,
    max_items: usize,
}

impl ValidationGate {
    pub fn new(validator: ImageValidator, max_items: usize) -> Self {
        Self {
            validator,
            max_items,
        }
    }

    pub fn from_config(config: &GalleryConfig) -> Self {
        Self::new(
            ImageValidator::new(
                config.max_file_size_bytes,
                config.allowed_content_types.clone(),
            ),
            config.max_images,
        )
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn remaining_capacity(&self, current_len: usize) -> usize {
        self.max_items.saturating_sub(current_len)
    }

    /// Split `files` into the admissible subset and the rejected remainder.
    pub fn admit(&self, files: Vec<MediaFile>, current_len: usize) -> Admission {
        let mut remaining = self.remaining_capacity(current_len);
        let mut admission = Admission::default();

        for file in files {
            if let Err(reason) =
                self.validator
                    .validate_all(&file.name, &file.mime_type, file.byte_size())
            {
                admission.rejected.push(Rejection {
                    file_name: file.name,
                    reason,
                });
                continue;
            }

            if remaining == 0 {
                admission.rejected.push(Rejection {
                    file_name: file.name,
                    reason: ValidationError::CapacityExceeded {
                        max: self.max_items,
                    },
                });
                continue;
            }

            remaining -= 1;
            admission.admitted.push(file);
        }

        if !admission.rejected.is_empty() {
            tracing::debug!(
                admitted = admission.admitted.len(),
                rejected = admission.rejected.len(),
                current_len,
                max_items = self.max_items,
                "Gallery admission rejected some files"
            );
        }

        admission
    }
}
