//! Video endpoints: draft creation, retrieval, and upload.

use crate::auth::models::Principal;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::utils::upload::extract_video_field;
use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use clipdock_core::models::CreateVideoRequest;
use clipdock_core::{AppError, VideoResponse};
use uuid::Uuid;
use validator::Validate;

fn parse_video_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::InvalidIdentifier(format!("'{}' is not a valid video id", raw)))
}

fn declared_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// POST /api/videos
pub async fn create_video(
    State(state): State<AppState>,
    principal: Principal,
    ValidatedJson(payload): ValidatedJson<CreateVideoRequest>,
) -> Result<(StatusCode, Json<VideoResponse>), HttpAppError> {
    payload.validate().map_err(AppError::from)?;

    let response = state
        .ingest
        .create_draft(principal.user_id, &payload.title)
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/videos/{video_id}
pub async fn get_video(
    State(state): State<AppState>,
    principal: Principal,
    Path(video_id): Path<String>,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let video_id = parse_video_id(&video_id)?;

    let response = state.ingest.fetch_owned(principal.user_id, video_id).await?;

    Ok(Json(response))
}

/// POST /api/videos/{video_id}/upload
///
/// The declared Content-Length is checked before the body is read; the
/// request body limit layer enforces the same ceiling while streaming.
pub async fn upload_video(
    State(state): State<AppState>,
    principal: Principal,
    Path(video_id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let video_id = parse_video_id(&video_id)?;

    let declared = declared_content_length(&headers);
    if let Some(declared) = declared {
        if declared > state.config.max_upload_bytes as u64 {
            return Err(HttpAppError(AppError::PayloadTooLarge(format!(
                "Declared length {} exceeds the {} byte limit",
                declared, state.config.max_upload_bytes
            ))));
        }
    }

    let upload = extract_video_field(multipart).await?;
    let declared_len = declared.unwrap_or(upload.data.len() as u64);

    let response = state
        .ingest
        .ingest(
            principal.user_id,
            video_id,
            &upload.content_type,
            declared_len,
            upload.data,
        )
        .await?;

    Ok(Json(response))
}
