//! Storage key derivation for published videos.
//!
//! Key format: `{class_dir}/{random}.{ext}` where `class_dir` comes from the
//! aspect class, `random` is 32 random bytes hex-encoded, and `ext` is the
//! media type's subtype.

use crate::traits::{StorageError, StorageResult};
use clipdock_core::AspectClass;
use rand::RngCore;

/// Derive a fresh storage key for a published video.
///
/// Keys are unguessable and carry no identity: neither the video id nor the
/// owner appears in them. The aspect class only selects the directory.
pub fn derive_storage_key(content_type: &str, class: AspectClass) -> StorageResult<String> {
    let ext = content_type
        .split('/')
        .nth(1)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            StorageError::InvalidKey(format!("media type '{}' has no subtype", content_type))
        })?;

    let mut random = [0u8; 32];
    rand::rng().fill_bytes(&mut random);

    Ok(format!("{}/{}.{}", class.dir_name(), hex::encode(random), ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_has_class_dir_random_stem_and_extension() {
        let key = derive_storage_key("video/mp4", AspectClass::Landscape).unwrap();

        let (dir, file) = key.split_once('/').unwrap();
        assert_eq!(dir, "landscape");

        let (stem, ext) = file.rsplit_once('.').unwrap();
        assert_eq!(ext, "mp4");
        assert_eq!(stem.len(), 64);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_consecutive_keys_differ() {
        let a = derive_storage_key("video/mp4", AspectClass::Portrait).unwrap();
        let b = derive_storage_key("video/mp4", AspectClass::Portrait).unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("portrait/"));
        assert!(b.starts_with("portrait/"));
    }

    #[test]
    fn test_malformed_media_type_is_rejected() {
        assert!(matches!(
            derive_storage_key("video", AspectClass::Other),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            derive_storage_key("video/", AspectClass::Other),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
