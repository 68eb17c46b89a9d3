// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Subresource Integrity (SRI) hashing
//!
//! Computes `sha384-...` integrity values for external scripts. Hashing is
//! behind [`SriHasher`] so remediation can run offline in tests.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use sha2::{Digest, Sha384};
use url::Url;

use crate::error::{Error, Result};

/// Default user agent for resource fetches
pub const DEFAULT_USER_AGENT: &str = concat!("kilpi/", env!("CARGO_PKG_VERSION"));

/// Produces integrity values for external resources
#[async_trait]
pub trait SriHasher: Send + Sync {
    /// Integrity attribute value (`sha384-<base64>`) for the resource at `url`
    async fn integrity(&self, url: &Url) -> Result<String>;
}

/// SRI value of raw resource bytes
pub fn sri_digest(bytes: &[u8]) -> String {
    format!("sha384-{}", STANDARD.encode(Sha384::digest(bytes)))
}

/// Resolve a `src` attribute to a fetchable URL.
///
/// Protocol-relative sources are taken as https. Relative paths and
/// non-http(s) schemes resolve to `None`.
pub fn resolve_source(src: &str) -> Option<Url> {
    let src = src.trim();
    let absolute = if src.starts_with("//") {
        format!("https:{}", src)
    } else {
        src.to_string()
    };

    let url = Url::parse(&absolute).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// HTTP fetch configuration
#[derive(Debug, Clone)]
pub struct SriFetchConfig {
    /// User agent string
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for SriFetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl SriFetchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Fetches resources over HTTP and hashes the body
#[derive(Clone)]
pub struct HttpSriHasher {
    client: Client,
}

impl HttpSriHasher {
    /// Create a hasher with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(SriFetchConfig::default())
    }

    /// Create a hasher with custom configuration
    pub fn with_config(config: SriFetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl SriHasher for HttpSriHasher {
    async fn integrity(&self, url: &Url) -> Result<String> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::sri_fetch(url.as_str(), status.as_u16()));
        }

        let body = response.bytes().await?;
        tracing::debug!(url = %url, bytes = body.len(), "Fetched resource for SRI");

        Ok(sri_digest(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_sri_digest_known_value() {
        // sha384 of the empty string
        assert_eq!(
            sri_digest(b""),
            "sha384-OLBgp1GsljhM2TJ+sbHjaiH9txEUvgdDTAzHv2P24donTt6/529l+9Ua0vFImLlb"
        );
    }

    #[test]
    fn test_resolve_source() {
        assert_eq!(
            resolve_source("//cdn.example.com/a.js").unwrap().as_str(),
            "https://cdn.example.com/a.js"
        );
        assert!(resolve_source("http://cdn.example.com/a.js").is_some());
        assert!(resolve_source("/js/app.js").is_none());
        assert!(resolve_source("app.js").is_none());
        assert!(resolve_source("data:text/javascript,alert(1)").is_none());
    }

    #[tokio::test]
    async fn test_http_hasher_hashes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lib.js"))
            .respond_with(ResponseTemplate::new(200).set_body_string("console.log(1);"))
            .mount(&server)
            .await;

        let hasher = HttpSriHasher::new().unwrap();
        let url = Url::parse(&format!("{}/lib.js", server.uri())).unwrap();

        let integrity = hasher.integrity(&url).await.unwrap();
        assert_eq!(integrity, sri_digest(b"console.log(1);"));
    }

    #[tokio::test]
    async fn test_http_hasher_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let hasher = HttpSriHasher::new().unwrap();
        let url = Url::parse(&format!("{}/missing.js", server.uri())).unwrap();

        let err = hasher.integrity(&url).await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert!(!err.is_fatal());
    }
}
