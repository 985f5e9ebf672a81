//! S3 client configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Static access credentials used to sign requests
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Session token for temporary credentials
    pub session_token: Option<String>,
}

impl Credentials {
    /// Create credentials from an access key pair
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Set the session token
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// S3 client configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct S3Config {
    /// Endpoint URL (scheme, host and optional port)
    pub endpoint: String,
    /// Signing region
    pub region: String,
    /// Credentials; requests are sent unsigned when absent
    pub credentials: Option<Credentials>,
    /// Address buckets as `/{bucket}/{key}` instead of `{bucket}.host/{key}`
    pub path_style: bool,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: "https://s3.us-east-1.amazonaws.com".to_string(),
            region: "us-east-1".to_string(),
            credentials: None,
            path_style: true,
            timeout: Duration::from_secs(30),
            user_agent: format!("filegate-store/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl S3Config {
    /// Create a new config with the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Config for the AWS regional endpoint
    pub fn for_region(region: impl Into<String>) -> Self {
        let region = region.into();
        Self {
            endpoint: format!("https://s3.{}.amazonaws.com", region),
            region,
            ..Default::default()
        }
    }

    /// Set the signing region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the credentials
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Use virtual-hosted-style bucket addressing
    pub fn with_virtual_hosted_style(mut self) -> Self {
        self.path_style = false;
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_region() {
        let config = S3Config::for_region("eu-west-1");
        assert_eq!(config.endpoint, "https://s3.eu-west-1.amazonaws.com");
        assert_eq!(config.region, "eu-west-1");
        assert!(config.path_style);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new("AKID", "super-secret").with_session_token("tok");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("AKID"));
        assert!(!printed.contains("super-secret"));
        assert!(!printed.contains("tok\""));
    }
}
