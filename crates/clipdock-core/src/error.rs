//! All failures in the ingest pipeline are unified under the `AppError`
//! enum: intake validation, staging, external tool invocation, storage and
//! metadata failures. Each variant self-describes its HTTP presentation
//! through the `ErrorMetadata` trait.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the
//! `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Severity the HTTP layer uses when it logs a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Client mistakes (bad ids, wrong media type); expected traffic.
    Debug,
    /// Degraded but handled conditions.
    Warn,
    /// Unexpected failures that need operator attention.
    Error,
}

/// How an error presents over HTTP.
///
/// Implemented once for [`AppError`] so handlers never pick status codes or
/// response wording ad hoc.
pub trait ErrorMetadata {
    /// Status code the response carries.
    fn http_status_code(&self) -> u16;

    /// Stable machine-readable code (e.g., "STORAGE_UNAVAILABLE").
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same request can succeed.
    fn is_recoverable(&self) -> bool;

    /// What the client should do about it, when there is an answer.
    fn suggested_action(&self) -> Option<&'static str>;

    /// Message safe to show the client; internal wording may differ.
    fn client_message(&self) -> String;

    /// Whether details must be withheld from production responses.
    fn is_sensitive(&self) -> bool;

    /// Severity for the server-side log line.
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed resource identifier in the request path.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Missing or unverifiable credentials.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated principal does not own the target record.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Declared content type is outside the allow-list.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Could not write the upload to its request-scoped staging area.
    #[error("Staging failed: {0}")]
    StagingFailed(String),

    /// The stream probe failed to run, parse, or found no video stream.
    #[error("Stream inspection failed: {0}")]
    InspectionFailed(String),

    /// The remux tool failed or produced an empty artifact.
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    /// The object store rejected or failed the put.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The object was stored but the record update failed. Carries the
    /// orphaned location so the update can be retried without re-uploading.
    #[error("Metadata update failed for stored object {bucket}/{key}: {detail}")]
    MetadataUpdateFailed {
        detail: String,
        bucket: String,
        key: String,
    },

    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("Malformed JSON: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidIdentifier(format!("Invalid UUID: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation failed: {}", err))
    }
}

/// Fixed presentation attributes for one variant.
///
/// `client_message` lives outside this table because several variants pass
/// dynamic text through.
struct ResponseMeta {
    status: u16,
    code: &'static str,
    recoverable: bool,
    action: Option<&'static str>,
    sensitive: bool,
    level: LogLevel,
}

fn response_meta(err: &AppError) -> ResponseMeta {
    match err {
        AppError::InvalidIdentifier(_) => ResponseMeta {
            status: 400,
            code: "INVALID_IDENTIFIER",
            recoverable: false,
            action: Some("Check the resource identifier format"),
            sensitive: false,
            level: LogLevel::Debug,
        },
        AppError::Unauthenticated(_) => ResponseMeta {
            status: 401,
            code: "UNAUTHENTICATED",
            recoverable: false,
            action: Some("Check the bearer token"),
            sensitive: false,
            level: LogLevel::Debug,
        },
        AppError::Forbidden(_) => ResponseMeta {
            status: 403,
            code: "FORBIDDEN",
            recoverable: false,
            action: Some("Verify the resource belongs to the authenticated user"),
            sensitive: false,
            level: LogLevel::Debug,
        },
        AppError::NotFound(_) => ResponseMeta {
            status: 404,
            code: "NOT_FOUND",
            recoverable: false,
            action: Some("Verify the resource ID exists"),
            sensitive: false,
            level: LogLevel::Debug,
        },
        AppError::PayloadTooLarge(_) => ResponseMeta {
            status: 413,
            code: "PAYLOAD_TOO_LARGE",
            recoverable: false,
            action: Some("Reduce file size"),
            sensitive: false,
            level: LogLevel::Debug,
        },
        AppError::UnsupportedMediaType(_) => ResponseMeta {
            status: 400,
            code: "UNSUPPORTED_MEDIA_TYPE",
            recoverable: false,
            action: Some("Upload an MP4 video"),
            sensitive: false,
            level: LogLevel::Debug,
        },
        AppError::StagingFailed(_) => ResponseMeta {
            status: 500,
            code: "STAGING_FAILED",
            recoverable: true,
            action: Some("Retry the upload"),
            sensitive: true,
            level: LogLevel::Error,
        },
        AppError::InspectionFailed(_) => ResponseMeta {
            status: 500,
            code: "INSPECTION_FAILED",
            recoverable: true,
            action: Some("Retry the upload; check the file is a valid video"),
            sensitive: true,
            level: LogLevel::Error,
        },
        AppError::ProcessingFailed(_) => ResponseMeta {
            status: 500,
            code: "PROCESSING_FAILED",
            recoverable: true,
            action: Some("Retry the upload; check the file is a valid video"),
            sensitive: true,
            level: LogLevel::Error,
        },
        AppError::StorageUnavailable(_) => ResponseMeta {
            status: 500,
            code: "STORAGE_UNAVAILABLE",
            recoverable: true,
            action: Some("Retry after a short delay"),
            sensitive: true,
            level: LogLevel::Error,
        },
        AppError::MetadataUpdateFailed { .. } => ResponseMeta {
            status: 500,
            code: "METADATA_UPDATE_FAILED",
            recoverable: true,
            action: Some("Retry publishing; the upload does not need to be repeated"),
            sensitive: true,
            level: LogLevel::Error,
        },
        AppError::Database(_) => ResponseMeta {
            status: 500,
            code: "DATABASE_ERROR",
            recoverable: true,
            action: Some("Retry after a short delay"),
            sensitive: true,
            level: LogLevel::Error,
        },
        AppError::InvalidInput(_) => ResponseMeta {
            status: 400,
            code: "INVALID_INPUT",
            recoverable: false,
            action: Some("Check request parameters and try again"),
            sensitive: false,
            level: LogLevel::Debug,
        },
        AppError::Internal(_) => ResponseMeta {
            status: 500,
            code: "INTERNAL_ERROR",
            recoverable: true,
            action: Some("Retry after a short delay"),
            sensitive: true,
            level: LogLevel::Error,
        },
        AppError::InternalWithSource { .. } => ResponseMeta {
            status: 500,
            code: "INTERNAL_ERROR",
            recoverable: true,
            action: Some("Retry after a short delay"),
            sensitive: true,
            level: LogLevel::Error,
        },
    }
}

impl AppError {
    /// Variant name exposed in non-production error bodies.
    pub fn error_type(&self) -> &str {
        match self {
            AppError::InvalidIdentifier(_) => "InvalidIdentifier",
            AppError::Unauthenticated(_) => "Unauthenticated",
            AppError::Forbidden(_) => "Forbidden",
            AppError::NotFound(_) => "NotFound",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::UnsupportedMediaType(_) => "UnsupportedMediaType",
            AppError::StagingFailed(_) => "StagingFailed",
            AppError::InspectionFailed(_) => "InspectionFailed",
            AppError::ProcessingFailed(_) => "ProcessingFailed",
            AppError::StorageUnavailable(_) => "StorageUnavailable",
            AppError::MetadataUpdateFailed { .. } => "MetadataUpdateFailed",
            AppError::Database(_) => "Database",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Render the error with its source chain for server-side logs.
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        // Walk the source chain, capped so a pathological chain cannot
        // flood the log.
        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (chain truncated)");
                break;
            }
            details.push_str(&format!("\n  caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        response_meta(self).status
    }

    fn error_code(&self) -> &'static str {
        response_meta(self).code
    }

    fn is_recoverable(&self) -> bool {
        response_meta(self).recoverable
    }

    fn suggested_action(&self) -> Option<&'static str> {
        response_meta(self).action
    }

    fn is_sensitive(&self) -> bool {
        response_meta(self).sensitive
    }

    fn log_level(&self) -> LogLevel {
        response_meta(self).level
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidIdentifier(ref msg) => msg.clone(),
            AppError::Unauthenticated(ref msg) => msg.clone(),
            AppError::Forbidden(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::UnsupportedMediaType(ref msg) => msg.clone(),
            // Internal failure details (paths, process stderr, backend
            // diagnostics) never reach the client.
            AppError::StagingFailed(_) => "Could not stage the uploaded file".to_string(),
            AppError::InspectionFailed(_) => "Could not inspect the video stream".to_string(),
            AppError::ProcessingFailed(_) => "Could not process the video".to_string(),
            AppError::StorageUnavailable(_) => "Could not store the video".to_string(),
            AppError::MetadataUpdateFailed { .. } => {
                "Video stored but the record update failed; retry publishing".to_string()
            }
            AppError::Database(_) => "Could not access the database".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_unsupported_media_type() {
        let err = AppError::UnsupportedMediaType("Only MP4 video is supported".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "UNSUPPORTED_MEDIA_TYPE");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Only MP4 video is supported");
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::NotFound("Video not found".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Video not found");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_payload_too_large() {
        let err = AppError::PayloadTooLarge("1073741825 bytes exceeds limit".to_string());
        assert_eq!(err.http_status_code(), 413);
        assert_eq!(err.error_code(), "PAYLOAD_TOO_LARGE");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_processing_failure_hides_diagnostics() {
        let err = AppError::ProcessingFailed(
            "ffmpeg exited with status 1: /tmp/stage-xyz/upload.mp4: moov atom not found"
                .to_string(),
        );
        assert_eq!(err.http_status_code(), 500);
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
        // The client message carries no file paths or tool output.
        assert!(!err.client_message().contains("/tmp"));
        assert!(!err.client_message().contains("ffmpeg"));
    }

    #[test]
    fn test_metadata_update_failed_carries_location() {
        let err = AppError::MetadataUpdateFailed {
            detail: "connection reset".to_string(),
            bucket: "videos".to_string(),
            key: "landscape/abcd.mp4".to_string(),
        };
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "METADATA_UPDATE_FAILED");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("videos/landscape/abcd.mp4"));
        assert!(!err.client_message().contains("landscape/abcd.mp4"));
        assert_eq!(
            err.suggested_action(),
            Some("Retry publishing; the upload does not need to be repeated")
        );
    }

    #[test]
    fn test_uuid_error_maps_to_invalid_identifier() {
        let uuid_err = uuid::Uuid::parse_str("not-a-uuid").unwrap_err();
        let err: AppError = uuid_err.into();
        assert_eq!(err.error_code(), "INVALID_IDENTIFIER");
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let source = anyhow::anyhow!("bind failed").context("listener setup");
        let err = AppError::InternalWithSource {
            message: "startup".to_string(),
            source,
        };
        let details = err.detailed_message();
        assert!(details.contains("caused by"));
    }
}
