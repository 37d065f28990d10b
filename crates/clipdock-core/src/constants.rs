//! Shared constants for upload limits and signing.

/// Hard ceiling for a single upload body. Checked against the declared
/// length before any byte is read and enforced again while reading.
pub const MAX_UPLOAD_BYTES: usize = 1 << 30; // 1 GiB

/// The only container type the ingest pipeline accepts.
pub const SUPPORTED_VIDEO_TYPE: &str = "video/mp4";

/// Default lifetime of a signed playback URL.
pub const DEFAULT_SIGN_TTL_SECS: u64 = 300;

/// Prefix for per-request staging directories.
pub const STAGING_DIR_PREFIX: &str = "clipdock-upload-";
