//! Clipdock Processing Library
//!
//! Wraps the external ffprobe/ffmpeg tools behind injectable traits so the
//! ingest pipeline can inspect stream geometry and remux containers without
//! coupling to process execution.

pub mod error;
pub mod probe;
pub mod remux;

pub use error::ProcessingError;
pub use probe::{FfprobeStreamProbe, StreamGeometry, StreamProbe};
pub use remux::{FfmpegRemuxer, Remuxer};
