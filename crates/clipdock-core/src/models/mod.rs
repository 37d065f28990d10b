//! Domain structures used throughout the gateway, organized by feature
//! area.

mod aspect;
mod location;
mod video;

// Flat re-exports; callers never name the submodules.
pub use aspect::AspectClass;
pub use location::{StorageBackend, StorageLocation};
pub use video::{CreateVideoRequest, VideoRecord, VideoResponse};
