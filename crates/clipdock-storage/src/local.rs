use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use clipdock_core::StorageBackend;
use rand::RngCore;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Logical container name recorded for locally stored objects.
const LOCAL_BUCKET: &str = "local";

/// Filesystem-backed storage for development and tests.
///
/// "Presigned" URLs carry a random token and expiry timestamp so they behave
/// like the S3 ones from the caller's point of view: fresh on every call,
/// not worth persisting.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Open the storage root at `base_path`, creating it if missing.
    /// `base_url` is the prefix the directory is served under
    /// (e.g. "http://localhost:4000/media").
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Could not create storage root {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path, base_url })
    }

    /// Resolve `storage_key` under the storage root, refusing traversal.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "key must be relative and free of '..'".to_string(),
            ));
        }

        let path = self.base_path.join(storage_key);

        if let Ok(canonical) = path.canonicalize() {
            let base_canonical = self.base_path.canonicalize().map_err(|e| {
                StorageError::ConfigError(format!("Could not canonicalize storage root: {}", e))
            })?;
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "key escapes the storage root".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Create any missing parent directories for `path`.
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(&self, storage_key: &str, _content_type: &str, data: Bytes) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        // sync_all before returning so a crash cannot leave a published
        // record pointing at a half-written file.
        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Could not create {}: {}", path.display(), e))
        })?;
        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Could not write {}: {}", path.display(), e))
        })?;
        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Could not sync {}: {}", path.display(), e))
        })?;

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(
            key = %storage_key,
            path = %path.display(),
            size_bytes = size,
            duration_ms,
            "stored object on local filesystem"
        );

        Ok(())
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.key_to_path(storage_key)?;

        let mut token = [0u8; 16];
        rand::rng().fill_bytes(&mut token);

        let expires_at = SystemTime::now()
            .checked_add(expires_in)
            .unwrap_or(SystemTime::now())
            .duration_since(UNIX_EPOCH)
            .map_err(|e| StorageError::SignFailed(e.to_string()))?
            .as_secs();

        Ok(format!(
            "{}/{}?token={}&expires={}",
            self.base_url.trim_end_matches('/'),
            storage_key,
            hex::encode(token),
            expires_at
        ))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn bucket(&self) -> &str {
        LOCAL_BUCKET
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage(dir: &tempfile::TempDir) -> LocalStorage {
        LocalStorage::new(dir.path(), "http://localhost:4000/media".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_writes_bytes_under_key() {
        let dir = tempdir().unwrap();
        let storage = storage(&dir).await;

        let data = Bytes::from_static(b"remuxed bytes");
        storage
            .put("landscape/abc123.mp4", "video/mp4", data.clone())
            .await
            .unwrap();

        let on_disk = std::fs::read(dir.path().join("landscape/abc123.mp4")).unwrap();
        assert_eq!(on_disk, data.to_vec());
        assert!(storage.exists("landscape/abc123.mp4").await.unwrap());
        assert!(!storage.exists("landscape/other.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_cannot_escape_storage_root() {
        let dir = tempdir().unwrap();
        let storage = storage(&dir).await;

        let traversal = storage
            .put("../../../tmp/escape.mp4", "video/mp4", Bytes::new())
            .await;
        assert!(matches!(traversal, Err(StorageError::InvalidKey(_))));

        let absolute = storage.exists("/etc/hostname").await;
        assert!(matches!(absolute, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_presigned_urls_are_fresh_each_call() {
        let dir = tempdir().unwrap();
        let storage = storage(&dir).await;

        let first = storage
            .get_presigned_url("portrait/clip.mp4", Duration::from_secs(300))
            .await
            .unwrap();
        let second = storage
            .get_presigned_url("portrait/clip.mp4", Duration::from_secs(300))
            .await
            .unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("http://localhost:4000/media/portrait/clip.mp4?"));
        assert!(first.contains("expires="));
    }
}
