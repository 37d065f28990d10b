//! Multipart intake helpers for the upload endpoint.

use axum::extract::Multipart;
use bytes::Bytes;
use clipdock_core::AppError;

/// One uploaded video body pulled out of a multipart form.
pub struct VideoUpload {
    pub data: Bytes,
    pub content_type: String,
}

/// Extract the single field named "video" from a multipart form.
/// Multiple video fields are rejected; other fields are ignored.
pub async fn extract_video_field(mut multipart: Multipart) -> Result<VideoUpload, AppError> {
    let mut upload: Option<VideoUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if field_name == "video" {
            if upload.is_some() {
                return Err(AppError::InvalidInput(
                    "Multiple video fields are not allowed; send exactly one field named 'video'"
                        .to_string(),
                ));
            }

            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());

            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Failed to read video data: {}", e)))?;

            upload = Some(VideoUpload { data, content_type });
        }
    }

    upload.ok_or_else(|| {
        AppError::InvalidInput("No multipart field named 'video' provided".to_string())
    })
}

/// Normalize a media type by stripping parameters
/// (e.g. "video/mp4; codecs=avc1" -> "video/mp4"). Comparison against the
/// allow-list happens on the normalized form only, so parameters can never
/// smuggle a type past the gate.
pub fn normalize_media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_parameters() {
        assert_eq!(
            normalize_media_type("video/mp4; codecs=\"avc1.42E01E\""),
            "video/mp4"
        );
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_media_type("  Video/MP4  "), "video/mp4");
    }

    #[test]
    fn normalize_keeps_plain_types_unchanged() {
        assert_eq!(normalize_media_type("image/png"), "image/png");
        assert_eq!(normalize_media_type(""), "");
    }
}
