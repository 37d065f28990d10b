//! Application bring-up.
//!
//! All startup wiring lives here: configuration validation, telemetry, the
//! database pool and migrations, the storage backend, the ingest service,
//! and the router.

pub mod database;
pub mod routes;
pub mod server;

use crate::services::IngestService;
use crate::state::AppState;
use anyhow::{Context, Result};
use clipdock_core::Config;
use clipdock_db::{PgVideoStore, VideoStore};
use clipdock_processing::{FfmpegRemuxer, FfprobeStreamProbe, Remuxer, StreamProbe};
use clipdock_storage::create_storage;
use std::sync::Arc;

/// Wire every subsystem and hand back the ready-to-serve router.
pub async fn initialize_app(config: Config) -> Result<axum::Router> {
    // Bad configuration should stop the process before any I/O happens.
    config.validate().context("validate configuration")?;

    crate::telemetry::init_telemetry();

    tracing::info!("configuration validated");

    let pool = database::setup_database(&config).await?;

    let storage = create_storage(&config)
        .await
        .context("initialize storage backend")?;

    let videos: Arc<dyn VideoStore> = Arc::new(PgVideoStore::new(pool));
    let probe: Arc<dyn StreamProbe> =
        Arc::new(FfprobeStreamProbe::new(config.ffprobe_path.clone()));
    let remuxer: Arc<dyn Remuxer> = Arc::new(FfmpegRemuxer::new(config.ffmpeg_path.clone()));
    let ingest = Arc::new(IngestService::new(videos, storage, probe, remuxer, &config));

    let state = AppState { config, ingest };
    Ok(routes::setup_routes(state))
}
