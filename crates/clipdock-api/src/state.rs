//! Application state shared across handlers.

use crate::services::IngestService;
use clipdock_core::Config;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub ingest: Arc<IngestService>,
}
