//! Error types for the filegate-store crate

use thiserror::Error;

/// Result type alias using `StoreError`
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while talking to an object store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error response returned by the storage API
    #[error("storage API error ({status} {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        request_id: Option<String>,
    },

    /// Connection error
    #[error("connection error: {0}")]
    Connection(String),

    /// Timeout error
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// HTTP error
    #[error("http error: {0}")]
    Http(String),

    /// Body stream failed after the response started
    #[error("stream error: {0}")]
    Stream(String),

    /// Response could not be parsed
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Key cannot be addressed over the HTTP API
    #[error("invalid object key: {0}")]
    InvalidKey(String),
}

impl StoreError {
    /// Storage API error code, if this error came from an error response
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Check if the error says the bucket itself is missing
    pub fn is_no_such_bucket(&self) -> bool {
        self.code() == Some("NoSuchBucket")
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout(err.to_string())
        } else if err.is_connect() {
            StoreError::Connection(err.to_string())
        } else if err.is_body() || err.is_decode() {
            StoreError::Stream(err.to_string())
        } else {
            StoreError::Http(err.to_string())
        }
    }
}

impl From<quick_xml::DeError> for StoreError {
    fn from(err: quick_xml::DeError) -> Self {
        StoreError::InvalidResponse(err.to_string())
    }
}

impl From<url::ParseError> for StoreError {
    fn from(err: url::ParseError) -> Self {
        StoreError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_code() {
        let err = StoreError::Api {
            status: 404,
            code: "NoSuchBucket".to_string(),
            message: "The specified bucket does not exist".to_string(),
            request_id: None,
        };
        assert!(err.is_no_such_bucket());
        assert_eq!(err.code(), Some("NoSuchBucket"));

        let err = StoreError::Http("boom".to_string());
        assert!(!err.is_no_such_bucket());
        assert_eq!(err.code(), None);
    }
}
