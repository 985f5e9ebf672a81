//! S3-compatible HTTP object store

use crate::signing::{self, SignableRequest};
use crate::{
    ListPage, ObjectBody, ObjectStore, ObjectSummary, PutObjectResult, Result, S3Config,
    StoreError,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use reqwest::{header, Client, Method, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

/// Object store backed by an S3-compatible HTTP API
pub struct S3ObjectStore {
    config: S3Config,
    endpoint: Url,
    http: Client,
}

impl S3ObjectStore {
    /// Create a new store client with the given configuration
    pub fn new(config: S3Config) -> Result<Self> {
        let endpoint = Url::parse(config.endpoint.trim_end_matches('/'))?;
        if endpoint.host_str().is_none() {
            return Err(StoreError::Configuration(format!(
                "endpoint has no host: {}",
                config.endpoint
            )));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            config,
            endpoint,
            http,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Host header value and canonical path for a bucket/key pair.
    ///
    /// Keys with `.` or `..` segments are rejected: URL parsing collapses
    /// them (even percent-encoded), so the request would reach a different
    /// path than the one signed.
    fn address(&self, bucket: &str, key: Option<&str>) -> Result<(String, String)> {
        if let Some(k) = key {
            if k.split('/').any(is_dot_segment) {
                return Err(StoreError::InvalidKey(k.to_string()));
            }
        }

        let mut host = self.endpoint.host_str().unwrap_or_default().to_string();
        if let Some(port) = self.endpoint.port() {
            host = format!("{}:{}", host, port);
        }
        let key_path = key.map(signing::encode_key_path);

        if self.config.path_style {
            let path = match key_path {
                Some(k) => format!("/{}/{}", signing::uri_encode(bucket), k),
                None => format!("/{}", signing::uri_encode(bucket)),
            };
            Ok((host, path))
        } else {
            let path = match key_path {
                Some(k) => format!("/{}", k),
                None => "/".to_string(),
            };
            Ok((format!("{}.{}", bucket, host), path))
        }
    }

    async fn request(
        &self,
        method: Method,
        bucket: &str,
        key: Option<&str>,
        query: &[(&str, String)],
        content_type: Option<&str>,
        body: Option<Bytes>,
    ) -> Result<Response> {
        let (host, canonical_uri) = self.address(bucket, key)?;
        let canonical_query = signing::canonical_query_string(query);

        let mut url = format!("{}://{}{}", self.endpoint.scheme(), host, canonical_uri);
        if !canonical_query.is_empty() {
            url.push('?');
            url.push_str(&canonical_query);
        }

        let mut req = self.http.request(method.clone(), url.as_str());

        if let Some(credentials) = &self.config.credentials {
            let payload_hash = match &body {
                Some(data) => signing::sha256_hex(data),
                None => signing::EMPTY_PAYLOAD_SHA256.to_string(),
            };
            let signed = signing::sign(
                &SignableRequest {
                    method: method.as_str(),
                    host: &host,
                    canonical_uri: &canonical_uri,
                    canonical_query: &canonical_query,
                    payload_hash: &payload_hash,
                },
                credentials,
                &self.config.region,
                Utc::now(),
            );
            for (name, value) in signed.into_pairs() {
                req = req.header(name, value);
            }
        }

        if let Some(ct) = content_type {
            req = req.header(header::CONTENT_TYPE, ct);
        }

        if let Some(data) = body {
            req = req.body(data);
        }

        debug!("Sending {} request to {}", method, url);
        Ok(req.send().await?)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self))]
    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> Result<ListPage> {
        let mut query = vec![("list-type", "2".to_string())];
        if let Some(token) = continuation_token {
            query.push(("continuation-token", token.to_string()));
        }

        let response = self
            .request(Method::GET, bucket, None, &query, None, None)
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let text = response.text().await?;
        parse_list_objects_response(&text)
    }

    #[instrument(skip(self))]
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectBody>> {
        let response = self
            .request(Method::GET, bucket, Some(key), &[], None, None)
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            let err = error_from_response(response).await;
            if err.is_no_such_bucket() {
                return Err(err);
            }
            debug!(key = %key, "Object not found");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(error_from_response(response).await);
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let content_length = response.content_length();

        let stream = response.bytes_stream().map_err(StoreError::from).boxed();

        Ok(Some(ObjectBody {
            content_type,
            content_length,
            stream,
        }))
    }

    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<PutObjectResult> {
        let response = self
            .request(Method::PUT, bucket, Some(key), &[], content_type, Some(data))
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim_matches('"').to_string());

        Ok(PutObjectResult { etag })
    }
}

fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}

// ==================== Response Parsers ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResultXml {
    #[serde(default)]
    contents: Vec<ContentsXml>,
    #[serde(default)]
    is_truncated: bool,
    next_continuation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContentsXml {
    key: String,
    last_modified: DateTime<Utc>,
    #[serde(rename = "ETag")]
    etag: Option<String>,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorXml {
    code: Option<String>,
    message: Option<String>,
    request_id: Option<String>,
}

fn parse_list_objects_response(xml: &str) -> Result<ListPage> {
    let parsed: ListBucketResultXml = quick_xml::de::from_str(xml)?;

    let objects = parsed
        .contents
        .into_iter()
        .map(|c| ObjectSummary {
            key: c.key,
            last_modified: c.last_modified,
            size: c.size,
            etag: c.etag.map(|e| e.trim_matches('"').to_string()),
        })
        .collect();

    Ok(ListPage {
        objects,
        is_truncated: parsed.is_truncated,
        next_continuation_token: parsed.next_continuation_token,
    })
}

/// Turn a non-success response into a `StoreError::Api`
async fn error_from_response(response: Response) -> StoreError {
    let status = response.status().as_u16();
    let header_request_id = response
        .headers()
        .get("x-amz-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let text = response.text().await.unwrap_or_default();

    let parsed: ErrorXml = if text.trim().is_empty() {
        ErrorXml::default()
    } else {
        quick_xml::de::from_str(&text).unwrap_or_default()
    };

    StoreError::Api {
        status,
        code: parsed.code.unwrap_or_else(|| format!("HTTP{}", status)),
        message: parsed.message.unwrap_or_else(|| "Unknown error".to_string()),
        request_id: parsed.request_id.or(header_request_id),
    }
}
