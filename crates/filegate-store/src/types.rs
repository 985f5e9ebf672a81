//! Common types shared by the store backends

use crate::StoreError;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Streamed object content
pub type ByteStream = BoxStream<'static, Result<Bytes, StoreError>>;

/// An object entry in a bucket listing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    /// Object key
    pub key: String,
    /// Last modified time
    pub last_modified: DateTime<Utc>,
    /// Size in bytes
    pub size: u64,
    /// ETag without surrounding quotes
    pub etag: Option<String>,
}

/// One page of a bucket listing
#[derive(Clone, Debug, Default)]
pub struct ListPage {
    /// Objects on this page, in store order
    pub objects: Vec<ObjectSummary>,
    /// Whether more pages follow
    pub is_truncated: bool,
    /// Token for fetching the next page
    pub next_continuation_token: Option<String>,
}

/// An opened object, ready to be streamed
pub struct ObjectBody {
    /// Content type recorded by the store
    pub content_type: Option<String>,
    /// Content length, when the store reports it
    pub content_length: Option<u64>,
    /// Object bytes
    pub stream: ByteStream,
}

impl fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBody")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

impl ObjectBody {
    /// Drain the stream into a single buffer
    pub async fn collect(self) -> Result<Bytes, StoreError> {
        use futures::TryStreamExt;

        let chunks: Vec<Bytes> = self.stream.try_collect().await?;
        Ok(Bytes::from(chunks.concat()))
    }
}

/// Put object result
#[derive(Clone, Debug, Default)]
pub struct PutObjectResult {
    /// ETag of the stored object
    pub etag: Option<String>,
}
