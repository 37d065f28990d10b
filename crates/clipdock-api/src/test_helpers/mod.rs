//! Shared test doubles for the ingest pipeline.
//!
//! In-memory stand-ins for the metadata store, the object store, and the
//! external probe/remux tools, plus helpers for minting bearer tokens and
//! building a fully wired router. Used by unit and integration tests; no
//! database, object store, or external binary is touched.

use crate::auth::models::Claims;
use crate::services::IngestService;
use crate::setup::routes::setup_routes;
use crate::state::AppState;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use clipdock_core::models::{StorageBackend, StorageLocation};
use clipdock_core::{AppError, Config, VideoRecord};
use clipdock_db::VideoStore;
use clipdock_processing::{ProcessingError, Remuxer, StreamGeometry, StreamProbe};
use clipdock_storage::{Storage, StorageError, StorageResult};
use jsonwebtoken::{encode, EncodingKey, Header};
use rand::RngCore;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-test-secret-test-secret!";

/// In-memory video store.
#[derive(Default)]
pub struct MemoryVideoStore {
    records: Mutex<HashMap<Uuid, VideoRecord>>,
    fail_set_location: AtomicBool,
}

impl MemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly.
    pub fn insert(&self, record: VideoRecord) {
        self.records.lock().unwrap().insert(record.id, record);
    }

    /// Snapshot of a record for assertions.
    pub fn record(&self, id: Uuid) -> Option<VideoRecord> {
        self.records.lock().unwrap().get(&id).cloned()
    }

    /// Make subsequent set_location calls fail.
    pub fn fail_set_location(&self, fail: bool) {
        self.fail_set_location.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn create_draft(&self, owner_id: Uuid, title: &str) -> Result<VideoRecord, AppError> {
        let now = Utc::now();
        let record = VideoRecord {
            id: Uuid::new_v4(),
            owner_id,
            title: title.to_string(),
            location: None,
            created_at: now,
            updated_at: now,
        };
        self.insert(record.clone());
        Ok(record)
    }

    async fn set_location(
        &self,
        id: Uuid,
        location: &StorageLocation,
    ) -> Result<VideoRecord, AppError> {
        if self.fail_set_location.load(Ordering::SeqCst) {
            return Err(AppError::Internal(
                "record update failure injected".to_string(),
            ));
        }
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;
        record.location = Some(location.clone());
        record.updated_at = Utc::now();
        Ok(record.clone())
    }
}

/// In-memory object store with a fixed logical bucket.
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_put: AtomicBool,
    bucket: String,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail_put: AtomicBool::new(false),
            bucket: "clips".to_string(),
        }
    }

    /// Make subsequent put calls fail.
    pub fn fail_put(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(&self, storage_key: &str, _content_type: &str, data: Bytes) -> StorageResult<()> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed(
                "storage outage injected".to_string(),
            ));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(storage_key.to_string(), data.to_vec());
        Ok(())
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let mut token = [0u8; 16];
        rand::rng().fill_bytes(&mut token);
        Ok(format!(
            "https://{}.test/{}?token={}&expires={}",
            self.bucket,
            storage_key,
            hex::encode(token),
            expires_in.as_secs()
        ))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(storage_key))
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Probe double reporting a fixed geometry.
///
/// Reads the staged file's metadata first, so tests exercise the staging
/// write; a missing geometry simulates a file with no video stream.
pub struct FakeProbe {
    geometry: Option<StreamGeometry>,
}

impl FakeProbe {
    pub fn reporting(width: u32, height: u32) -> Self {
        Self {
            geometry: Some(StreamGeometry { width, height }),
        }
    }

    pub fn with_no_video_stream() -> Self {
        Self { geometry: None }
    }
}

#[async_trait]
impl StreamProbe for FakeProbe {
    async fn geometry(&self, path: &Path) -> Result<StreamGeometry, ProcessingError> {
        tokio::fs::metadata(path).await?;
        self.geometry.ok_or(ProcessingError::NoVideoStream)
    }
}

/// Remux double: copies the staged input or fails like the real tool.
#[derive(Default)]
pub struct FakeRemuxer {
    fail: AtomicBool,
}

impl FakeRemuxer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent remux calls fail.
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Remuxer for FakeRemuxer {
    async fn remux_faststart(&self, input: &Path, output: &Path) -> Result<(), ProcessingError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProcessingError::ToolFailed {
                tool: "ffmpeg",
                status: "exit status: 1".to_string(),
                stderr: "moov atom not found".to_string(),
            });
        }
        tokio::fs::copy(input, output).await?;
        Ok(())
    }
}

/// Config for tests. Database and storage settings are placeholders since
/// tests inject in-memory collaborators.
pub fn test_config() -> Config {
    Config {
        server_port: 0,
        cors_origins: vec!["*".to_string()],
        environment: "test".to_string(),
        database_url: "postgresql://localhost/clipdock_test".to_string(),
        db_max_connections: 1,
        db_timeout_seconds: 5,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        storage_backend: StorageBackend::Local,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: None,
        local_storage_base_url: None,
        max_upload_bytes: 1 << 30,
        sign_ttl_secs: 300,
        ffprobe_path: "ffprobe".to_string(),
        ffmpeg_path: "ffmpeg".to_string(),
        staging_dir: None,
    }
}

/// Mint a bearer token for `user_id`, expiring `ttl_secs` from now.
/// Pass a negative value for an already expired token.
pub fn mint_token(user_id: Uuid, ttl_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        exp: now + ttl_secs,
        iat: now,
        nbf: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Everything a test needs to drive the API against in-memory collaborators.
pub struct TestHarness {
    pub videos: Arc<MemoryVideoStore>,
    pub storage: Arc<MemoryStorage>,
    pub remuxer: Arc<FakeRemuxer>,
    pub ingest: Arc<IngestService>,
    pub config: Config,
}

impl TestHarness {
    pub fn new(probe: FakeProbe) -> Self {
        Self::with_config(test_config(), probe)
    }

    pub fn with_config(config: Config, probe: FakeProbe) -> Self {
        let videos = Arc::new(MemoryVideoStore::new());
        let storage = Arc::new(MemoryStorage::new());
        let remuxer = Arc::new(FakeRemuxer::new());
        let ingest = Arc::new(IngestService::new(
            videos.clone(),
            storage.clone(),
            Arc::new(probe),
            remuxer.clone(),
            &config,
        ));
        Self {
            videos,
            storage,
            remuxer,
            ingest,
            config,
        }
    }

    /// Router wired exactly like production, minus the real backends.
    pub fn router(&self) -> axum::Router {
        let state = AppState {
            config: self.config.clone(),
            ingest: self.ingest.clone(),
        };
        setup_routes(state)
    }

    /// Seed a draft owned by `owner_id` and return its id.
    pub fn seed_draft(&self, owner_id: Uuid, title: &str) -> Uuid {
        let now = Utc::now();
        let record = VideoRecord {
            id: Uuid::new_v4(),
            owner_id,
            title: title.to_string(),
            location: None,
            created_at: now,
            updated_at: now,
        };
        let id = record.id;
        self.videos.insert(record);
        id
    }
}
