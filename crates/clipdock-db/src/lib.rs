//! Clipdock Database Library
//!
//! PostgreSQL repositories for Clipdock. The `VideoStore` trait abstracts
//! the videos table so services and tests can swap in fakes.

pub mod videos;

pub use videos::{PgVideoStore, VideoStore};
