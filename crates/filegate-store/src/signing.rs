//! AWS Signature Version 4 request signing.
//!
//! Only the pieces the S3 client needs: header-based signing of a request
//! whose payload hash is known up front.
//! Based on: <https://docs.aws.amazon.com/AmazonS3/latest/API/sig-v4-header-based-auth.html>

use crate::Credentials;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";

/// SHA-256 of the empty payload
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// The parts of a request that go into the signature
#[derive(Debug, Clone, Copy)]
pub struct SignableRequest<'a> {
    pub method: &'a str,
    /// Host header value, including a non-default port
    pub host: &'a str,
    /// Already URI-encoded path
    pub canonical_uri: &'a str,
    /// Output of [`canonical_query_string`]
    pub canonical_query: &'a str,
    /// Hex SHA-256 of the payload
    pub payload_hash: &'a str,
}

/// Headers to attach to a signed request
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub content_sha256: String,
    pub security_token: Option<String>,
}

impl SignedHeaders {
    /// Header name/value pairs in the order they should be added
    pub fn into_pairs(self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("authorization", self.authorization),
            ("x-amz-date", self.amz_date),
            ("x-amz-content-sha256", self.content_sha256),
        ];
        if let Some(token) = self.security_token {
            pairs.push(("x-amz-security-token", token));
        }
        pairs
    }
}

/// Sign a request at time `now`
pub fn sign(
    request: &SignableRequest<'_>,
    credentials: &Credentials,
    region: &str,
    now: DateTime<Utc>,
) -> SignedHeaders {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();

    let mut canonical_headers = format!(
        "host:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n",
        request.host.trim(),
        request.payload_hash,
        amz_date
    );
    let mut signed_headers = String::from("host;x-amz-content-sha256;x-amz-date");
    if let Some(token) = &credentials.session_token {
        canonical_headers.push_str(&format!("x-amz-security-token:{}\n", token.trim()));
        signed_headers.push_str(";x-amz-security-token");
    }

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        request.method,
        request.canonical_uri,
        request.canonical_query,
        canonical_headers,
        signed_headers,
        request.payload_hash
    );

    let credential_scope = format!("{}/{}/{}/aws4_request", date_stamp, region, SERVICE);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        credential_scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let k_date = hmac_sha256(
        format!("AWS4{}", credentials.secret_access_key).as_bytes(),
        date_stamp.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, SERVICE.as_bytes());
    let k_signing = hmac_sha256(&k_service, b"aws4_request");
    let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes()));

    let authorization = format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, credentials.access_key_id, credential_scope, signed_headers, signature
    );

    SignedHeaders {
        authorization,
        amz_date,
        content_sha256: request.payload_hash.to_string(),
        security_token: credentials.session_token.clone(),
    }
}

/// Percent-encode per RFC 3986, leaving only unreserved characters
pub fn uri_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Encode an object key for use in a path, keeping `/` separators
pub fn encode_key_path(key: &str) -> String {
    key.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}

/// Build the canonical query string: encoded pairs sorted by name then value
pub fn canonical_query_string(params: &[(&str, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (uri_encode(k), uri_encode(v)))
        .collect();
    encoded.sort();
    encoded
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Hex-encoded SHA-256
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
