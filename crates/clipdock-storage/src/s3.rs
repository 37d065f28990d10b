use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use clipdock_core::StorageBackend;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload, Result as ObjectResult};
use std::time::Duration;

/// S3-backed storage.
///
/// Credentials come from the environment (`AWS_ACCESS_KEY_ID` etc.); bucket,
/// region and an optional custom endpoint come from config so S3-compatible
/// providers (MinIO, Spaces) work too.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
}

impl S3Storage {
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        // Plain-http endpoints are only ever local dev setups.
        if let Some(ref endpoint) = endpoint_url {
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage { store, bucket })
    }

    fn object_path(storage_key: &str) -> Path {
        Path::from(storage_key.to_string())
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(&self, storage_key: &str, _content_type: &str, data: Bytes) -> StorageResult<()> {
        let path = Self::object_path(storage_key);
        let size_bytes = data.len() as u64;
        let started = std::time::Instant::now();

        let outcome: ObjectResult<_> = self.store.put(&path, PutPayload::from(data)).await;
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok(_) => {
                tracing::info!(
                    bucket = %self.bucket,
                    key = %storage_key,
                    size_bytes,
                    duration_ms,
                    "stored object in S3"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    size_bytes,
                    duration_ms,
                    "S3 put failed"
                );
                Err(StorageError::UploadFailed(e.to_string()))
            }
        }
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let path = Self::object_path(storage_key);

        let signed: ObjectResult<_> = self.store.signed_url(Method::GET, &path, expires_in).await;

        signed
            .map(|url| url.to_string())
            .map_err(|e| StorageError::SignFailed(e.to_string()))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        match self.store.head(&Self::object_path(storage_key)).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
