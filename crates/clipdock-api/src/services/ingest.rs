//! Upload ingestion pipeline.
//!
//! One service owns the whole publish path: intake gates, staging,
//! stream inspection, fast-start remux, storage write, record update, and
//! response signing. Validation and ownership run before any disk or
//! network I/O; the record is only updated after the artifact is durably
//! stored, so a failed request never leaves a partially published video.

use crate::utils::upload::normalize_media_type;
use bytes::Bytes;
use clipdock_core::constants::{STAGING_DIR_PREFIX, SUPPORTED_VIDEO_TYPE};
use clipdock_core::models::StorageLocation;
use clipdock_core::{AppError, Config, VideoRecord, VideoResponse};
use clipdock_db::VideoStore;
use clipdock_processing::{Remuxer, StreamProbe};
use clipdock_storage::{derive_storage_key, Storage, StorageError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use uuid::Uuid;

/// Name of the staged upload inside its request-scoped directory.
const RAW_FILE_NAME: &str = "raw.mp4";
/// Name of the remuxed artifact inside the staging directory.
const REMUXED_FILE_NAME: &str = "faststart.mp4";

pub struct IngestService {
    videos: Arc<dyn VideoStore>,
    storage: Arc<dyn Storage>,
    probe: Arc<dyn StreamProbe>,
    remuxer: Arc<dyn Remuxer>,
    max_upload_bytes: u64,
    sign_ttl: Duration,
    staging_dir: Option<PathBuf>,
}

impl IngestService {
    pub fn new(
        videos: Arc<dyn VideoStore>,
        storage: Arc<dyn Storage>,
        probe: Arc<dyn StreamProbe>,
        remuxer: Arc<dyn Remuxer>,
        config: &Config,
    ) -> Self {
        Self {
            videos,
            storage,
            probe,
            remuxer,
            max_upload_bytes: config.max_upload_bytes as u64,
            sign_ttl: Duration::from_secs(config.sign_ttl_secs),
            staging_dir: config.staging_dir.as_ref().map(PathBuf::from),
        }
    }

    /// Run the full publish pipeline for one uploaded body.
    #[tracing::instrument(skip_all, fields(video.id = %video_id, upload.declared_bytes = declared_len))]
    pub async fn ingest(
        &self,
        owner_id: Uuid,
        video_id: Uuid,
        content_type: &str,
        declared_len: u64,
        data: Bytes,
    ) -> Result<VideoResponse, AppError> {
        let start = Instant::now();

        if declared_len > self.max_upload_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Declared length {} exceeds the {} byte limit",
                declared_len, self.max_upload_bytes
            )));
        }
        if data.len() as u64 > self.max_upload_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Upload of {} bytes exceeds the {} byte limit",
                data.len(),
                self.max_upload_bytes
            )));
        }

        let media_type = normalize_media_type(content_type);
        if media_type != SUPPORTED_VIDEO_TYPE {
            return Err(AppError::UnsupportedMediaType(format!(
                "Unsupported media type '{}'; only '{}' is accepted",
                media_type, SUPPORTED_VIDEO_TYPE
            )));
        }

        let record = self
            .videos
            .get(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

        if record.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Video belongs to a different user".to_string(),
            ));
        }

        // Both staged files live in one request-scoped directory; dropping
        // the guard removes them on every return path below.
        let staging = self.staging_dir()?;
        let raw_path = staging.path().join(RAW_FILE_NAME);
        tokio::fs::write(&raw_path, &data)
            .await
            .map_err(|e| AppError::StagingFailed(format!("write {}: {}", raw_path.display(), e)))?;

        let geometry = self
            .probe
            .geometry(&raw_path)
            .await
            .map_err(|e| AppError::InspectionFailed(e.to_string()))?;
        let class = geometry.aspect_class();

        let remuxed_path = staging.path().join(REMUXED_FILE_NAME);
        self.remuxer
            .remux_faststart(&raw_path, &remuxed_path)
            .await
            .map_err(|e| AppError::ProcessingFailed(e.to_string()))?;

        let storage_key = derive_storage_key(&media_type, class).map_err(map_storage_error)?;

        let artifact = tokio::fs::read(&remuxed_path).await.map_err(|e| {
            AppError::StagingFailed(format!("read {}: {}", remuxed_path.display(), e))
        })?;
        let artifact_len = artifact.len();
        self.storage
            .put(&storage_key, &media_type, Bytes::from(artifact))
            .await
            .map_err(map_storage_error)?;

        let location = StorageLocation::new(self.storage.bucket(), &storage_key);
        let updated = match self.videos.set_location(video_id, &location).await {
            Ok(updated) => updated,
            Err(e) => {
                // The object is durable but unreferenced; the logged pair is
                // everything republish() needs to finish the job.
                tracing::error!(
                    error = %e,
                    bucket = %location.bucket,
                    key = %location.key,
                    video_id = %video_id,
                    "Stored object left unreferenced by failed record update"
                );
                return Err(AppError::MetadataUpdateFailed {
                    detail: e.to_string(),
                    bucket: location.bucket,
                    key: location.key,
                });
            }
        };

        tracing::info!(
            video_id = %video_id,
            aspect_class = %class,
            bucket = %location.bucket,
            key = %location.key,
            size_bytes = artifact_len,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video published"
        );

        self.signed_response(updated).await
    }

    /// Retry the record update for an artifact that is already stored.
    ///
    /// Recovery path for `MetadataUpdateFailed`: the object exists under
    /// `location` but the record never learned about it. The object is
    /// verified before the record is pointed at it; no bytes are moved.
    pub async fn republish(
        &self,
        video_id: Uuid,
        location: &StorageLocation,
    ) -> Result<VideoResponse, AppError> {
        if location.bucket != self.storage.bucket() {
            return Err(AppError::StorageUnavailable(format!(
                "Bucket '{}' is not served by the configured storage backend",
                location.bucket
            )));
        }
        if !self
            .storage
            .exists(&location.key)
            .await
            .map_err(map_storage_error)?
        {
            return Err(AppError::NotFound(format!(
                "No stored object at {}/{}",
                location.bucket, location.key
            )));
        }

        let updated = match self.videos.set_location(video_id, location).await {
            Ok(updated) => updated,
            Err(e @ AppError::NotFound(_)) => return Err(e),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %location.bucket,
                    key = %location.key,
                    video_id = %video_id,
                    "Republish attempt failed; object remains unreferenced"
                );
                return Err(AppError::MetadataUpdateFailed {
                    detail: e.to_string(),
                    bucket: location.bucket.clone(),
                    key: location.key.clone(),
                });
            }
        };

        self.signed_response(updated).await
    }

    /// Create a draft record owned by the caller; no media yet.
    pub async fn create_draft(
        &self,
        owner_id: Uuid,
        title: &str,
    ) -> Result<VideoResponse, AppError> {
        let record = self.videos.create_draft(owner_id, title).await?;
        Ok(VideoResponse::from_record(record, None))
    }

    /// Fetch a record the caller owns, with a fresh URL when published.
    pub async fn fetch_owned(
        &self,
        owner_id: Uuid,
        video_id: Uuid,
    ) -> Result<VideoResponse, AppError> {
        let record = self
            .videos
            .get(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

        if record.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Video belongs to a different user".to_string(),
            ));
        }

        self.signed_response(record).await
    }

    /// Convert a record into its API shape, minting a fresh signed URL when
    /// the record references a stored artifact. Drafts come back with no
    /// URL; the signed form is never persisted.
    pub async fn signed_response(&self, record: VideoRecord) -> Result<VideoResponse, AppError> {
        let video_url = match &record.location {
            Some(location) => {
                if location.bucket != self.storage.bucket() {
                    tracing::warn!(
                        bucket = %location.bucket,
                        configured = %self.storage.bucket(),
                        video_id = %record.id,
                        "Record references a bucket the configured backend does not serve"
                    );
                    return Err(AppError::StorageUnavailable(format!(
                        "Bucket '{}' is not served by the configured storage backend",
                        location.bucket
                    )));
                }
                Some(
                    self.storage
                        .get_presigned_url(&location.key, self.sign_ttl)
                        .await
                        .map_err(map_storage_error)?,
                )
            }
            None => None,
        };

        Ok(VideoResponse::from_record(record, video_url))
    }

    fn staging_dir(&self) -> Result<TempDir, AppError> {
        let staging = match &self.staging_dir {
            Some(dir) => TempDir::with_prefix_in(STAGING_DIR_PREFIX, dir),
            None => TempDir::with_prefix(STAGING_DIR_PREFIX),
        };
        staging.map_err(|e| AppError::StagingFailed(format!("create staging directory: {}", e)))
    }
}

fn map_storage_error(e: StorageError) -> AppError {
    match e {
        StorageError::NotFound(key) => {
            AppError::NotFound(format!("Stored object {} not found", key))
        }
        StorageError::InvalidKey(detail) => AppError::InvalidInput(detail),
        other => AppError::StorageUnavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FakeProbe, TestHarness};
    use chrono::Utc;

    fn draft(harness: &TestHarness) -> (Uuid, Uuid) {
        let owner_id = Uuid::new_v4();
        let video_id = harness.seed_draft(owner_id, "Morning run");
        (owner_id, video_id)
    }

    #[tokio::test]
    async fn test_declared_length_gate_fires_before_any_side_effect() {
        let harness = TestHarness::new(FakeProbe::reporting(1920, 1080));
        let (owner_id, video_id) = draft(&harness);

        let err = harness
            .ingest
            .ingest(
                owner_id,
                video_id,
                "video/mp4",
                (1 << 30) + 1,
                Bytes::from_static(b"tiny"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PayloadTooLarge(_)));
        assert_eq!(harness.storage.object_count(), 0);
        assert!(harness.videos.record(video_id).unwrap().is_draft());
    }

    #[tokio::test]
    async fn test_oversized_body_rejected_despite_small_declared_length() {
        let mut config = crate::test_helpers::test_config();
        config.max_upload_bytes = 16;
        let harness = TestHarness::with_config(config, FakeProbe::reporting(1920, 1080));
        let (owner_id, video_id) = draft(&harness);

        let err = harness
            .ingest
            .ingest(
                owner_id,
                video_id,
                "video/mp4",
                1,
                Bytes::from(vec![0u8; 64]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }

    #[tokio::test]
    async fn test_republish_recovers_after_failed_record_update() {
        let harness = TestHarness::new(FakeProbe::reporting(1080, 1920));
        let (owner_id, video_id) = draft(&harness);

        harness.videos.fail_set_location(true);
        let err = harness
            .ingest
            .ingest(
                owner_id,
                video_id,
                "video/mp4",
                9,
                Bytes::from_static(b"mp4 bytes"),
            )
            .await
            .unwrap_err();

        // The artifact is stored but the record is still a draft.
        let (bucket, key) = match err {
            AppError::MetadataUpdateFailed { bucket, key, .. } => (bucket, key),
            other => panic!("expected MetadataUpdateFailed, got {:?}", other),
        };
        assert_eq!(bucket, "clips");
        assert!(key.starts_with("portrait/"));
        assert_eq!(harness.storage.object_count(), 1);
        assert!(harness.videos.record(video_id).unwrap().is_draft());

        // Retrying just the record update publishes without re-uploading.
        harness.videos.fail_set_location(false);
        let response = harness
            .ingest
            .republish(video_id, &StorageLocation::new(bucket, key.clone()))
            .await
            .unwrap();

        assert!(response.video_url.is_some());
        let record = harness.videos.record(video_id).unwrap();
        assert_eq!(record.location.unwrap().key, key);
        assert_eq!(harness.storage.object_count(), 1);
    }

    #[tokio::test]
    async fn test_republish_rejects_object_that_was_never_stored() {
        let harness = TestHarness::new(FakeProbe::reporting(1920, 1080));
        let (_, video_id) = draft(&harness);

        let err = harness
            .ingest
            .republish(
                video_id,
                &StorageLocation::new("clips", "landscape/missing.mp4"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(harness.videos.record(video_id).unwrap().is_draft());
    }

    #[tokio::test]
    async fn test_signing_rejects_unserved_bucket() {
        let harness = TestHarness::new(FakeProbe::reporting(1920, 1080));
        let now = Utc::now();
        let record = VideoRecord {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Archived clip".to_string(),
            location: Some(StorageLocation::new(
                "decommissioned",
                "landscape/feed.mp4",
            )),
            created_at: now,
            updated_at: now,
        };

        let err = harness.ingest.signed_response(record).await.unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn test_consecutive_signing_calls_mint_distinct_urls() {
        let harness = TestHarness::new(FakeProbe::reporting(1920, 1080));
        let (owner_id, video_id) = draft(&harness);

        harness
            .ingest
            .ingest(
                owner_id,
                video_id,
                "video/mp4",
                9,
                Bytes::from_static(b"mp4 bytes"),
            )
            .await
            .unwrap();

        let first = harness
            .ingest
            .fetch_owned(owner_id, video_id)
            .await
            .unwrap()
            .video_url
            .unwrap();
        let second = harness
            .ingest
            .fetch_owned(owner_id, video_id)
            .await
            .unwrap()
            .video_url
            .unwrap();

        assert_ne!(first, second);
        let stored_key = &harness.videos.record(video_id).unwrap().location.unwrap().key;
        assert!(first.contains(stored_key.as_str()));
    }
}
