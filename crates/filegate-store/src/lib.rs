//! # Filegate Store
//!
//! Object storage backends for the Filegate file gateway.
//!
//! This crate provides:
//! - **ObjectStore trait**: list, get (streamed) and put against a bucket
//! - **S3 backend**: S3-compatible HTTP client with AWS Signature V4 signing
//! - **Memory backend**: in-process store for tests and local development
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              File Gateway               │
//! ├─────────────────────────────────────────┤
//! │           ObjectStore Trait             │
//! ├────────────────────┬────────────────────┤
//! │   S3ObjectStore    │ MemoryObjectStore  │
//! ├────────────────────┴────────────────────┤
//! │   S3 / MinIO / any S3-compatible API    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use filegate_store::{ObjectStore, S3Config, S3ObjectStore};
//!
//! let store = S3ObjectStore::new(S3Config::new("http://localhost:9000"))?;
//! store.put_object("bucket", "hello.txt", data, Some("text/plain")).await?;
//! let objects = store.list_all_objects("bucket").await?;
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod s3;
pub mod signing;
pub mod types;

pub use config::{Credentials, S3Config};
pub use error::{Result, StoreError};
pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;
pub use types::{ByteStream, ListPage, ObjectBody, ObjectSummary, PutObjectResult};

use async_trait::async_trait;
use bytes::Bytes;

/// Content type used when neither the caller nor the store supplies one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Upper bound on listing pages followed by [`ObjectStore::list_all_objects`]
pub const MAX_LIST_PAGES: usize = 10_000;

/// Trait for object storage backends
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one page of the bucket listing, starting at `continuation_token`
    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> Result<ListPage>;

    /// Open an object for streaming. `Ok(None)` means the key does not exist.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectBody>>;

    /// Store an object, replacing any existing object under the same key
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<PutObjectResult>;

    /// List every object in the bucket by following continuation tokens
    async fn list_all_objects(&self, bucket: &str) -> Result<Vec<ObjectSummary>> {
        let mut objects = Vec::new();
        let mut token: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let page = self.list_objects(bucket, token.as_deref()).await?;
            objects.extend(page.objects);

            if !page.is_truncated {
                return Ok(objects);
            }

            match page.next_continuation_token {
                Some(next) if token.as_deref() == Some(next.as_str()) => {
                    return Err(StoreError::InvalidResponse(format!(
                        "listing of {} repeated continuation token {}",
                        bucket, next
                    )));
                }
                Some(next) => token = Some(next),
                None => {
                    return Err(StoreError::InvalidResponse(format!(
                        "listing of {} is truncated but has no continuation token",
                        bucket
                    )));
                }
            }
        }

        Err(StoreError::InvalidResponse(format!(
            "listing of {} exceeded {} pages",
            bucket, MAX_LIST_PAGES
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Store that hands out fixed listing pages in order
    struct ScriptedPages {
        pages: Mutex<Vec<ListPage>>,
    }

    impl ScriptedPages {
        fn new(mut pages: Vec<ListPage>) -> Self {
            pages.reverse();
            Self {
                pages: Mutex::new(pages),
            }
        }
    }

    #[async_trait]
    impl ObjectStore for ScriptedPages {
        async fn list_objects(&self, _bucket: &str, _token: Option<&str>) -> Result<ListPage> {
            self.pages
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| StoreError::InvalidResponse("no more pages".to_string()))
        }

        async fn get_object(&self, _bucket: &str, _key: &str) -> Result<Option<ObjectBody>> {
            Ok(None)
        }

        async fn put_object(
            &self,
            _bucket: &str,
            _key: &str,
            _data: Bytes,
            _content_type: Option<&str>,
        ) -> Result<PutObjectResult> {
            Ok(PutObjectResult::default())
        }
    }

    fn page(keys: &[&str], next: Option<&str>, is_truncated: bool) -> ListPage {
        ListPage {
            objects: keys
                .iter()
                .map(|k| ObjectSummary {
                    key: k.to_string(),
                    last_modified: Utc::now(),
                    size: 1,
                    etag: None,
                })
                .collect(),
            is_truncated,
            next_continuation_token: next.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_list_all_joins_pages_in_order() {
        let store = ScriptedPages::new(vec![
            page(&["a", "b"], Some("t1"), true),
            page(&["c"], Some("t2"), true),
            page(&["d"], None, false),
        ]);

        let keys: Vec<String> = store
            .list_all_objects("files")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        assert_eq!(keys, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_truncated_page_without_token_is_error() {
        let store = ScriptedPages::new(vec![
            page(&["a"], Some("t1"), true),
            page(&["b"], None, true),
        ]);

        let err = store.list_all_objects("files").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidResponse(ref msg) if msg.contains("no continuation token")));
    }

    #[tokio::test]
    async fn test_repeated_token_is_error() {
        let store = ScriptedPages::new(vec![
            page(&["a"], Some("t1"), true),
            page(&["b"], Some("t1"), true),
        ]);

        let err = store.list_all_objects("files").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidResponse(ref msg) if msg.contains("repeated")));
    }

    #[tokio::test]
    async fn test_untruncated_page_ignores_stray_token() {
        let store = ScriptedPages::new(vec![page(&["a"], Some("stale"), false)]);
        assert_eq!(store.list_all_objects("files").await.unwrap().len(), 1);
    }
}
