use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::location::StorageLocation;

/// A video row as stored in the database.
///
/// `location` is `None` for drafts that have been created but not yet
/// ingested. Once ingestion publishes an artifact the pair is set
/// atomically; the schema forbids a half-set location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub location: Option<StorageLocation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn is_draft(&self) -> bool {
        self.location.is_none()
    }
}

/// API representation of a video.
///
/// Carries a freshly minted presigned URL instead of the raw storage
/// location; drafts serialize with `video_url: null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoResponse {
    pub fn from_record(record: VideoRecord, video_url: Option<String>) -> Self {
        Self {
            id: record.id,
            owner_id: record.owner_id,
            title: record.title,
            video_url,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Payload for creating a draft video record.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateVideoRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(location: Option<StorageLocation>) -> VideoRecord {
        let now = Utc::now();
        VideoRecord {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Boots and cats".to_string(),
            location,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_draft_has_no_location() {
        let record = record(None);
        assert!(record.is_draft());

        let response = VideoResponse::from_record(record, None);
        assert!(response.video_url.is_none());
    }

    #[test]
    fn test_response_does_not_expose_storage_location() {
        let record = record(Some(StorageLocation::new("clips", "other/feed.mp4")));
        let response = VideoResponse::from_record(
            record.clone(),
            Some("https://cdn.example/signed".to_string()),
        );

        assert_eq!(response.id, record.id);
        assert_eq!(response.video_url.as_deref(), Some("https://cdn.example/signed"));

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("location").is_none());
        assert!(json.get("storage_key").is_none());
    }

    #[test]
    fn test_create_request_rejects_empty_and_oversized_titles() {
        let empty = CreateVideoRequest {
            title: String::new(),
        };
        assert!(empty.validate().is_err());

        let oversized = CreateVideoRequest {
            title: "x".repeat(201),
        };
        assert!(oversized.validate().is_err());

        let ok = CreateVideoRequest {
            title: "Morning run".to_string(),
        };
        assert!(ok.validate().is_ok());
    }
}
