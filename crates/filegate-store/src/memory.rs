//! In-memory object store for testing and local development

use crate::{
    ListPage, ObjectBody, ObjectStore, ObjectSummary, PutObjectResult, Result, StoreError,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use md5::{Digest, Md5};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Default number of keys returned per listing page
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Size of the chunks `get_object` streams
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Clone, Debug)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
    etag: String,
    last_modified: DateTime<Utc>,
}

/// An in-memory object store.
///
/// Buckets must be created before use, mirroring a real backend where a
/// missing bucket is an error rather than an empty listing.
#[derive(Clone)]
pub struct MemoryObjectStore {
    buckets: Arc<DashMap<String, BTreeMap<String, StoredObject>>>,
    page_size: usize,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    /// Create a new store with no buckets
    pub fn new() -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Create a store with one empty bucket
    pub fn with_bucket(bucket: impl Into<String>) -> Self {
        let store = Self::new();
        store.create_bucket(bucket);
        store
    }

    /// Set the listing page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Create a bucket if it does not exist
    pub fn create_bucket(&self, bucket: impl Into<String>) {
        self.buckets.entry(bucket.into()).or_default();
    }

    /// Number of objects in a bucket
    pub fn object_count(&self, bucket: &str) -> usize {
        self.buckets.get(bucket).map(|b| b.len()).unwrap_or(0)
    }

    /// Read an object without streaming
    pub fn object_bytes(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.buckets
            .get(bucket)
            .and_then(|b| b.get(key).map(|o| o.data.clone()))
    }

    fn no_such_bucket(bucket: &str) -> StoreError {
        StoreError::Api {
            status: 404,
            code: "NoSuchBucket".to_string(),
            message: format!("The specified bucket does not exist: {}", bucket),
            request_id: None,
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> Result<ListPage> {
        let objects = self
            .buckets
            .get(bucket)
            .ok_or_else(|| Self::no_such_bucket(bucket))?;

        // The token is the last key of the previous page
        let range = match continuation_token {
            Some(after) => objects.range::<str, _>((
                std::ops::Bound::Excluded(after),
                std::ops::Bound::Unbounded,
            )),
            None => objects.range::<str, _>(..),
        };

        let mut page: Vec<ObjectSummary> = range
            .take(self.page_size + 1)
            .map(|(key, obj)| ObjectSummary {
                key: key.clone(),
                last_modified: obj.last_modified,
                size: obj.data.len() as u64,
                etag: Some(obj.etag.clone()),
            })
            .collect();

        let is_truncated = page.len() > self.page_size;
        page.truncate(self.page_size);
        let next_continuation_token = if is_truncated {
            page.last().map(|o| o.key.clone())
        } else {
            None
        };

        Ok(ListPage {
            objects: page,
            is_truncated,
            next_continuation_token,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectBody>> {
        let object = {
            let objects = self
                .buckets
                .get(bucket)
                .ok_or_else(|| Self::no_such_bucket(bucket))?;
            match objects.get(key) {
                Some(obj) => obj.clone(),
                None => return Ok(None),
            }
        };

        let data = object.data;
        let chunks: Vec<Result<Bytes>> = (0..data.len())
            .step_by(STREAM_CHUNK_SIZE)
            .map(|start| Ok(data.slice(start..(start + STREAM_CHUNK_SIZE).min(data.len()))))
            .collect();

        Ok(Some(ObjectBody {
            content_type: object.content_type,
            content_length: Some(data.len() as u64),
            stream: Box::pin(futures::stream::iter(chunks)),
        }))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<PutObjectResult> {
        let mut objects = self
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::no_such_bucket(bucket))?;

        let etag = hex::encode(Md5::digest(&data));
        objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.map(str::to_string),
                etag: etag.clone(),
                last_modified: Utc::now(),
            },
        );

        Ok(PutObjectResult { etag: Some(etag) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryObjectStore::with_bucket("files");

        let result = store
            .put_object("files", "hello.txt", Bytes::from_static(b"Hello, World!"), Some("text/plain"))
            .await
            .unwrap();
        assert_eq!(result.etag.as_deref(), Some("65a8e27d8879283831b664bd8b7f0ad4"));

        let body = store.get_object("files", "hello.txt").await.unwrap().unwrap();
        assert_eq!(body.content_type.as_deref(), Some("text/plain"));
        assert_eq!(body.content_length, Some(13));
        assert_eq!(body.collect().await.unwrap().as_ref(), b"Hello, World!");
    }

    #[tokio::test]
    async fn test_memory_store_missing_key() {
        let store = MemoryObjectStore::with_bucket("files");
        assert!(store.get_object("files", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_missing_bucket() {
        let store = MemoryObjectStore::new();
        let err = store.list_objects("ghost", None).await.unwrap_err();
        assert!(err.is_no_such_bucket());

        let err = store
            .put_object("ghost", "a", Bytes::new(), None)
            .await
            .unwrap_err();
        assert!(err.is_no_such_bucket());
    }

    #[tokio::test]
    async fn test_memory_store_overwrite() {
        let store = MemoryObjectStore::with_bucket("files");
        store.put_object("files", "a", Bytes::from_static(b"one"), None).await.unwrap();
        store.put_object("files", "a", Bytes::from_static(b"two"), None).await.unwrap();

        assert_eq!(store.object_count("files"), 1);
        assert_eq!(store.object_bytes("files", "a").unwrap().as_ref(), b"two");
    }

    #[tokio::test]
    async fn test_memory_store_streams_in_chunks() {
        let store = MemoryObjectStore::with_bucket("files");
        let data = Bytes::from(vec![7u8; STREAM_CHUNK_SIZE * 2 + 10]);
        store.put_object("files", "big.bin", data.clone(), None).await.unwrap();

        let body = store.get_object("files", "big.bin").await.unwrap().unwrap();
        let chunks: Vec<Bytes> = futures::TryStreamExt::try_collect(body.stream).await.unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), data.to_vec());
    }

    #[tokio::test]
    async fn test_memory_store_pagination() {
        let store = MemoryObjectStore::with_bucket("files").with_page_size(2);
        for name in ["e", "a", "d", "c", "b"] {
            store.put_object("files", name, Bytes::from_static(b"x"), None).await.unwrap();
        }

        let first = store.list_objects("files", None).await.unwrap();
        assert!(first.is_truncated);
        assert_eq!(first.next_continuation_token.as_deref(), Some("b"));

        let all = store.list_all_objects("files").await.unwrap();
        let keys: Vec<_> = all.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_memory_store_empty_bucket_lists_nothing() {
        let store = MemoryObjectStore::with_bucket("files");
        let page = store.list_objects("files", None).await.unwrap();
        assert!(page.objects.is_empty());
        assert!(!page.is_truncated);
    }
}
