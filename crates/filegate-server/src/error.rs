//! Error types and their HTTP mapping

use crate::handlers::BatchOutcome;
use axum::{
    extract::multipart::MultipartError,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use filegate_store::StoreError;
use thiserror::Error;

/// API error type.
///
/// Every variant renders as a plain-text body; the detailed `Display` form is
/// only written to the log.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No bucket configured
    #[error("bucket name is not configured")]
    MissingBucket,

    /// Missing or unusable request payload
    #[error("{0}")]
    BadRequest(String),

    /// Object or listing not found
    #[error("{0}")]
    NotFound(String),

    /// Object store call failed
    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    /// At least one put in a batch upload failed
    #[error("{} of {} uploads failed: {}", .0.failed().count(), .0.len(), .0.failure_details())]
    BatchFailed(BatchOutcome),

    /// Multipart body could not be decoded
    #[error("multipart error: {0}")]
    Multipart(#[from] MultipartError),

    /// Response could not be built
    #[error("failed to build response: {0}")]
    Http(#[from] axum::http::Error),
}

impl ApiError {
    /// Wrap a store error with the message shown to the client
    pub fn store(context: &'static str, source: StoreError) -> Self {
        Self::Store { context, source }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Multipart(e) => e.status(),
            Self::MissingBucket | Self::Store { .. } | Self::BatchFailed(_) | Self::Http(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Plain-text message returned to the client
    pub fn client_message(&self) -> String {
        match self {
            Self::MissingBucket | Self::Http(_) => "Internal server error".to_string(),
            Self::BadRequest(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Store { context, .. } => context.to_string(),
            Self::BatchFailed(outcome) => {
                format!("Error uploading files: {}", outcome.failure_summary())
            }
            Self::Multipart(e) => e.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::warn!(status = %status.as_u16(), error = %self, "Request rejected");
        }

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.client_message(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::FileOutcome;
    use rstest::rstest;

    #[rstest]
    #[case(ApiError::MissingBucket, StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")]
    #[case(ApiError::BadRequest("No file uploaded".into()), StatusCode::BAD_REQUEST, "No file uploaded")]
    #[case(ApiError::NotFound("File not found".into()), StatusCode::NOT_FOUND, "File not found")]
    #[case(
        ApiError::store("Error listing files", StoreError::Http("connection reset".into())),
        StatusCode::INTERNAL_SERVER_ERROR,
        "Error listing files"
    )]
    fn test_status_and_message(
        #[case] err: ApiError,
        #[case] status: StatusCode,
        #[case] message: &str,
    ) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.client_message(), message);
    }

    #[test]
    fn test_store_error_keeps_root_cause() {
        let err = ApiError::store("Error uploading file", StoreError::Timeout("30s".into()));
        let logged = err.to_string();
        assert!(logged.starts_with("Error uploading file"));
        assert!(logged.contains("timed out"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_batch_failure_names_failed_files() {
        let outcome = BatchOutcome::new(vec![
            FileOutcome::ok("a.txt"),
            FileOutcome::failed("b.txt", "AccessDenied"),
        ]);
        let err = ApiError::BatchFailed(outcome);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "Error uploading files: b.txt");
        assert!(err.to_string().starts_with("1 of 2 uploads failed"));
    }

    #[test]
    fn test_response_is_plain_text() {
        let response = ApiError::NotFound("No files found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }
}
