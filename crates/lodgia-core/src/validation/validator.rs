use std::path::Path;

/// Reasons a proposed file is refused before any upload starts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Unsupported content type: {content_type} (allowed: {allowed:?})")]
    UnsupportedType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Content type {content_type} does not match extension '{extension}' (expected one of: {expected})")]
    ExtensionMismatch {
        extension: String,
        content_type: String,
        expected: String,
    },

    #[error("Empty file")]
    EmptyFile,

    #[error("Gallery is full: at most {max} photos")]
    CapacityExceeded { max: usize },
}

impl ValidationError {
    pub fn is_capacity(&self) -> bool {
        matches!(self, ValidationError::CapacityExceeded { .. })
    }
}

/// Per-file checks for gallery images.
///
/// Validates one file at a time without knowing about the collection; capacity
/// is the gate's concern.
#[derive(Debug, Clone)]
pub struct ImageValidator {
    max_file_size: u64,
    allowed_content_types: Vec<String>,
}

impl ImageValidator {
    pub fn new(max_file_size: u64, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| ct.trim().to_lowercase())
                .collect(),
        }
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate content type
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = normalize_content_type(content_type);

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(ValidationError::UnsupportedType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Reject files whose declared type contradicts a known image extension.
    ///
    /// Names without an extension, or with one we do not know, are accepted:
    /// camera and clipboard captures often arrive as `blob` or `image`.
    pub fn validate_extension_content_type_match(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<(), ValidationError> {
        let Some(extension) = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
        else {
            return Ok(());
        };

        let normalized_content_type = normalize_content_type(content_type);

        let expected_content_types: &[&str] = match extension.as_str() {
            "jpg" | "jpeg" | "jfif" => &["image/jpeg", "image/pjpeg"],
            "png" => &["image/png"],
            "gif" => &["image/gif"],
            "webp" => &["image/webp"],
            "avif" => &["image/avif"],
            "heic" => &["image/heic", "image/heif"],
            "heif" => &["image/heif", "image/heic"],
            "bmp" => &["image/bmp"],
            "svg" => &["image/svg+xml"],
            _ => {
                tracing::debug!(
                    extension = %extension,
                    content_type = %content_type,
                    "Unknown extension, skipping Content-Type/extension cross-validation"
                );
                return Ok(());
            }
        };

        if !expected_content_types
            .iter()
            .any(|ct| *ct == normalized_content_type)
        {
            return Err(ValidationError::ExtensionMismatch {
                extension,
                content_type: content_type.to_string(),
                expected: expected_content_types.join(", "),
            });
        }

        Ok(())
    }

    /// Validate all per-file aspects, including Content-Type/extension matching
    pub fn validate_all(
        &self,
        filename: &str,
        content_type: &str,
        file_size: u64,
    ) -> Result<(), ValidationError> {
        self.validate_file_size(file_size)?;
        self.validate_content_type(content_type)?;
        self.validate_extension_content_type_match(filename, content_type)?;
        Ok(())
    }
}

/// Lowercase and strip parameters such as `; charset=binary`.
fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase()
}
