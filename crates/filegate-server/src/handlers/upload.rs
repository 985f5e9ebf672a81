//! Upload handlers

use crate::multipart::{collect_files, UploadedFile};
use crate::{ApiError, AppState};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
};
use filegate_store::ObjectStore;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info};

/// Form field carrying the file for `/upload`
pub const SINGLE_FILE_FIELD: &str = "file";

/// Form field carrying the files for `/upload-multiple`
pub const MULTI_FILE_FIELD: &str = "files";

/// Result of storing one file of a batch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileOutcome {
    /// Object key the file was written to
    pub file_name: String,
    /// Store error, if the put failed
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn ok(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            error: None,
        }
    }

    pub fn failed(file_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-file results of a batch upload, in request order.
///
/// Puts that succeeded stay stored even when others fail.
#[derive(Clone, Debug, Default)]
pub struct BatchOutcome {
    results: Vec<FileOutcome>,
}

impl BatchOutcome {
    pub fn new(results: Vec<FileOutcome>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[FileOutcome] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.results.iter().filter(|r| !r.is_ok())
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &FileOutcome> {
        self.results.iter().filter(|r| r.is_ok())
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(FileOutcome::is_ok)
    }

    /// Names of the files that failed
    pub fn failure_summary(&self) -> String {
        self.failed()
            .map(|r| r.file_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Names and errors of the files that failed
    pub fn failure_details(&self) -> String {
        self.failed()
            .map(|r| format!("{} ({})", r.file_name, r.error.as_deref().unwrap_or_default()))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// POST /upload - Store a single file under its original name
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, &'static str), ApiError> {
    let bucket = state.bucket()?;

    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "Request is not a multipart form");
        ApiError::BadRequest("No file uploaded".to_string())
    })?;

    let file = collect_files(&mut multipart, SINGLE_FILE_FIELD, 1)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let size = file.len();
    state
        .store
        .put_object(bucket, &file.original_name, file.content, Some(&file.mime_type))
        .await
        .map_err(|e| ApiError::store("Error uploading file", e))?;

    info!(bucket = %bucket, key = %file.original_name, size, "File uploaded");
    Ok((StatusCode::OK, "File uploaded successfully"))
}

/// POST /upload-multiple - Store up to `max_files` files concurrently
///
/// Any failed put turns the whole batch into a 500.
pub async fn upload_multiple_files(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, &'static str), ApiError> {
    let bucket = state.bucket()?;

    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "Request is not a multipart form");
        ApiError::BadRequest("No files uploaded".to_string())
    })?;

    let files = collect_files(&mut multipart, MULTI_FILE_FIELD, state.config.max_files).await?;
    if files.is_empty() {
        return Err(ApiError::BadRequest("No files uploaded".to_string()));
    }

    let outcome = put_all(state.store.as_ref(), bucket, &files).await;
    if !outcome.is_success() {
        return Err(ApiError::BatchFailed(outcome));
    }

    info!(bucket = %bucket, count = outcome.len(), "Files uploaded");
    Ok((StatusCode::OK, "All files uploaded successfully"))
}

/// Start one put per file and wait for all of them
async fn put_all(store: &dyn ObjectStore, bucket: &str, files: &[UploadedFile]) -> BatchOutcome {
    let puts = files.iter().map(|file| async move {
        match store
            .put_object(bucket, &file.original_name, file.content.clone(), Some(&file.mime_type))
            .await
        {
            Ok(_) => FileOutcome::ok(&file.original_name),
            Err(e) => {
                error!(bucket = %bucket, key = %file.original_name, error = %e, "Error uploading file");
                FileOutcome::failed(&file.original_name, e.to_string())
            }
        }
    });

    BatchOutcome::new(join_all(puts).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_outcome_accounting() {
        let outcome = BatchOutcome::new(vec![
            FileOutcome::ok("a.txt"),
            FileOutcome::failed("b.txt", "timeout"),
            FileOutcome::ok("c.txt"),
            FileOutcome::failed("d.txt", "AccessDenied"),
        ]);

        assert!(!outcome.is_success());
        assert_eq!(outcome.len(), 4);
        assert_eq!(outcome.succeeded().count(), 2);
        assert_eq!(outcome.failure_summary(), "b.txt, d.txt");
        assert_eq!(outcome.failure_details(), "b.txt (timeout); d.txt (AccessDenied)");
    }

    #[test]
    fn test_all_ok_batch_is_success() {
        let outcome = BatchOutcome::new(vec![FileOutcome::ok("a.txt")]);
        assert!(outcome.is_success());
        assert_eq!(outcome.failure_summary(), "");
    }
}
