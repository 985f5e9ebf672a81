//! Listing handler

use crate::{ApiError, AppState};
use axum::{extract::State, Json};
use chrono::{DateTime, SecondsFormat, Utc};
use filegate_store::ObjectSummary;
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// A file in the bucket listing
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    /// Object key
    pub file_name: String,
    /// Last modified time, RFC 3339 with milliseconds
    #[serde(serialize_with = "serialize_timestamp")]
    pub last_modified: DateTime<Utc>,
    /// Size in bytes
    pub size: u64,
}

impl From<ObjectSummary> for FileDescriptor {
    fn from(object: ObjectSummary) -> Self {
        Self {
            file_name: object.key,
            last_modified: object.last_modified,
            size: object.size,
        }
    }
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// GET /list-files - List every object in the bucket
///
/// An empty bucket is reported as 404 rather than an empty array.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FileDescriptor>>, ApiError> {
    let bucket = state.bucket()?;

    let objects = state
        .store
        .list_all_objects(bucket)
        .await
        .map_err(|e| ApiError::store("Error listing files", e))?;

    if objects.is_empty() {
        return Err(ApiError::NotFound("No files found".to_string()));
    }

    tracing::debug!(bucket = %bucket, count = objects.len(), "Listed files");
    Ok(Json(objects.into_iter().map(FileDescriptor::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_descriptor_json_shape() {
        let descriptor = FileDescriptor::from(ObjectSummary {
            key: "report.pdf".to_string(),
            last_modified: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            size: 2048,
            etag: Some("abc".to_string()),
        });

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "fileName": "report.pdf",
                "lastModified": "2024-03-01T12:30:00.000Z",
                "size": 2048
            })
        );
    }
}
