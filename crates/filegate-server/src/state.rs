//! Application state

use crate::config::{GatewayConfig, StoreBackend};
use crate::ApiError;
use filegate_store::{MemoryObjectStore, ObjectStore, S3ObjectStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// Object store client, reused by every request
    pub store: Arc<dyn ObjectStore>,
}

impl AppState {
    /// Create the application state, building the configured store client
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn ObjectStore> = match &config.store {
            StoreBackend::Memory => {
                warn!("⚠ Storage mode: In-memory (NOT persistent - for development only)");
                let store = MemoryObjectStore::new();
                if let Some(bucket) = config.bucket() {
                    store.create_bucket(bucket);
                }
                Arc::new(store)
            }
            StoreBackend::S3(s3) => {
                info!(
                    endpoint = %s3.endpoint,
                    region = %s3.region,
                    signed = s3.credentials.is_some(),
                    "✓ Storage mode: S3-compatible"
                );
                if s3.credentials.is_none() {
                    warn!("No credentials configured - requests to the object store are unsigned");
                }
                Arc::new(S3ObjectStore::new(s3.clone())?)
            }
        };

        Ok(Self::with_store(config, store))
    }

    /// Create the application state around an existing store
    pub fn with_store(config: GatewayConfig, store: Arc<dyn ObjectStore>) -> Self {
        match config.bucket() {
            Some(bucket) => info!(bucket = %bucket, "Serving bucket"),
            None => warn!("Bucket name is not configured - every request will fail"),
        }

        Self { config, store }
    }

    /// Bucket for the current request; fails before any store call when unset
    pub fn bucket(&self) -> Result<&str, ApiError> {
        self.config.bucket().ok_or(ApiError::MissingBucket)
    }
}
