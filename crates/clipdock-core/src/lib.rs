//! Clipdock Core Library
//!
//! Domain models, error types, configuration, and constants shared across
//! all clipdock components.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// The types nearly every crate in the workspace touches.
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{AspectClass, StorageBackend, StorageLocation, VideoRecord, VideoResponse};
