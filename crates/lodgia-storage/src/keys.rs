//! Shared key generation for storage backends.
//!
//! Key format: `media/{parent_id}/{unique}-{filename}`. The unique prefix keeps
//! two uploads of the same file name (or a retry) from overwriting each other.

use uuid::Uuid;

/// Generate a storage key for a photo of `parent_id`.
pub fn generate_storage_key(parent_id: &str, filename: &str) -> String {
    format!(
        "media/{}/{}-{}",
        sanitize_segment(parent_id),
        Uuid::new_v4().simple(),
        sanitize_segment(filename)
    )
}

/// Reduce a user-supplied name to a single safe path segment.
pub fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned.replace("..", "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_scoped_to_parent() {
        let key = generate_storage_key("room-7", "Living Room.jpg");
        assert!(key.starts_with("media/room-7/"));
        assert!(key.ends_with("-Living_Room.jpg"));
    }

    #[test]
    fn test_keys_are_unique_per_upload() {
        assert_ne!(
            generate_storage_key("room-7", "a.jpg"),
            generate_storage_key("room-7", "a.jpg")
        );
    }

    #[test]
    fn test_sanitize_blocks_traversal() {
        assert_eq!(sanitize_segment("../../etc/passwd"), "___etc_passwd");
        assert!(!sanitize_segment("..").contains(".."));
        assert_eq!(sanitize_segment("   "), "unnamed");
        assert_eq!(sanitize_segment("photo.JPG"), "photo.JPG");
    }
}
