//! Clipdock API
//!
//! HTTP surface of the video gateway: authentication middleware, the
//! draft/read/upload endpoints, the ingest pipeline service, and all
//! application setup.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod test_helpers;
pub mod utils;

pub use error::{ErrorResponse, HttpAppError};
pub use services::IngestService;
pub use state::AppState;
