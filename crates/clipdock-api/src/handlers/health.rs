//! Liveness probe, outside the auth boundary.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// GET /healthz
pub async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "alive" })))
}
