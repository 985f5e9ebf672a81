//! Gateway configuration

use filegate_store::S3Config;
use serde::{Deserialize, Serialize};

/// Default port, matching the conventional `PORT` fallback
pub const DEFAULT_PORT: u16 = 3000;

/// Maximum number of parts accepted by `/upload-multiple`
pub const DEFAULT_MAX_FILES: usize = 10;

/// Which object store the gateway talks to
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum StoreBackend {
    /// In-process store; data is lost on restart
    Memory,
    /// S3-compatible HTTP API
    S3(S3Config),
}

/// Gateway server configuration.
///
/// Built once at startup and shared read-only by every request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Bucket serving all requests. When unset, every request fails with 500.
    pub bucket: Option<String>,
    /// Object store backend
    pub store: StoreBackend,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
    /// Maximum files per batch upload
    pub max_files: usize,
    /// Enable permissive CORS
    pub cors_enabled: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            bucket: None,
            store: StoreBackend::Memory,
            max_body_size: 100 * 1024 * 1024, // 100 MB
            max_files: DEFAULT_MAX_FILES,
            cors_enabled: true,
        }
    }
}

impl GatewayConfig {
    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Set the bucket
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Configured bucket, treating an empty name as unset
    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref().filter(|b| !b.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.max_files, 10);
        assert!(config.bucket().is_none());
    }

    #[test]
    fn test_blank_bucket_is_unset() {
        let config = GatewayConfig::default().with_bucket("  ");
        assert!(config.bucket().is_none());

        let config = GatewayConfig::default().with_bucket("files");
        assert_eq!(config.bucket(), Some("files"));
    }
}
