//! Backend-agnostic storage interface.
//!
//! The rest of the workspace only ever sees `Arc<dyn Storage>`; which
//! backend sits behind it is a deployment decision.

use async_trait::async_trait;
use bytes::Bytes;
use clipdock_core::StorageBackend;
use std::time::Duration;
use thiserror::Error;

/// Failures surfaced by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Put failed: {0}")]
    UploadFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    SignFailed(String),

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Storage configuration error: {0}")]
    ConfigError(String),
}

/// Shorthand for results carrying a [`StorageError`].
pub type StorageResult<T> = Result<T, StorageError>;

/// What every storage backend exposes to the rest of the workspace.
///
/// The ingest pipeline works against this trait so publishing is not coupled
/// to a specific provider.
///
/// Objects are private: playback access always goes through a short-lived
/// URL from [`get_presigned_url`](Storage::get_presigned_url), never a
/// durable public URL.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store an object under `storage_key`, replacing any existing object
    /// at that key.
    async fn put(&self, storage_key: &str, content_type: &str, data: Bytes) -> StorageResult<()>;

    /// Mint a time-limited URL for direct GET access to an object.
    ///
    /// Every call produces a fresh URL; callers must not persist the result.
    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Whether an object is present under `storage_key`.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Container name recorded alongside keys in video locations.
    fn bucket(&self) -> &str;

    /// Which backend this instance talks to.
    fn backend_type(&self) -> StorageBackend;
}
