//! HTTP rendering of application errors.
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>` and use `?` on
//! anything convertible into `AppError`; the wrapper picks the status, logs
//! at the variant's level, and writes one consistent JSON body shape.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use clipdock_core::{AppError, ErrorMetadata, LogLevel};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Full internal message with source chain; omitted in production and
    /// for sensitive errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Stable code clients can branch on.
    pub code: String,
    /// Whether retrying can succeed.
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Newtype around [`AppError`]; orphan rules keep us from implementing the
/// foreign `IntoResponse` trait on the core crate's type directly.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

/// JSON body extractor whose rejection is our [`ErrorResponse`] shape
/// (400 + JSON) instead of axum's plain-text default.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_failure(error: &AppError) {
    let kind = error.error_type();
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(error = %error, kind, "request failed"),
        LogLevel::Warn => tracing::warn!(error = %error, kind, "request failed"),
        LogLevel::Error => tracing::error!(error = %error, kind, "request failed"),
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| matches!(env.to_lowercase().as_str(), "production" | "prod"))
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_failure(app_error);

        let mut body = ErrorResponse {
            error: app_error.client_message(),
            details: Some(app_error.detailed_message()),
            error_type: Some(app_error.error_type().to_string()),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
        };

        // Production responses carry no internals; sensitive errors carry
        // none anywhere.
        if is_production_env() || app_error.is_sensitive() {
            body.details = None;
            body.error_type = None;
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_renders_404_with_code() {
        let response =
            HttpAppError(AppError::NotFound("Video not found".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Video not found");
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["recoverable"], false);
    }

    #[tokio::test]
    async fn test_sensitive_error_never_exposes_diagnostics() {
        let response = HttpAppError(AppError::ProcessingFailed(
            "ffmpeg exited with status 1: /tmp/clipdock-upload-xyz/raw.mp4".to_string(),
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["code"], "PROCESSING_FAILED");
        assert!(body.get("details").is_none());
        let rendered = body.to_string();
        assert!(!rendered.contains("/tmp"));
        assert!(!rendered.contains("ffmpeg"));
    }

    #[tokio::test]
    async fn test_non_sensitive_error_carries_details_outside_production() {
        let response = HttpAppError(AppError::UnsupportedMediaType(
            "Unsupported media type 'image/png'; only 'video/mp4' is accepted".to_string(),
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], "UNSUPPORTED_MEDIA_TYPE");
        assert_eq!(body["error_type"], "UnsupportedMediaType");
        assert!(body["details"].as_str().unwrap().contains("image/png"));
    }
}
