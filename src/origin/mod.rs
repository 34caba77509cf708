//! Upstream build server client
//!
//! Every request carries the fixed identifying user agent. When
//! `origin.insecure_tls` is set (the default, the origin being a fixed
//! development endpoint) certificate and hostname verification are disabled.

pub mod latest;

pub use latest::{Clock, LatestResolver, LATEST_ALIAS};

use crate::cache::CacheEntry;
use crate::config::OriginConfig;
use crate::error::{Result, TileError};
use crate::logger;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, Response};
use std::time::Duration;

/// Origin response headers kept for relaying and caching, in relay order
pub const RELAYED_HEADERS: [&str; 5] = [
    "Content-Type",
    "Content-Length",
    "Content-Range",
    "Accept-Ranges",
    "ETag",
];

/// Metadata-only existence check used by [`LatestResolver`]
#[async_trait]
pub trait ExistenceProbe: Send + Sync {
    /// `true` only when the origin confirms the resource; any failure is `false`
    async fn exists(&self, resource: &str) -> bool;
}

/// HTTP client bound to the origin base URL
#[derive(Debug, Clone)]
pub struct OriginClient {
    client: Client,
    base_url: String,
    /// Certificate and hostname checks are both off
    insecure_tls: bool,
}

impl OriginClient {
    pub fn new(config: &OriginConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs));
        if config.insecure_tls {
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }
        let client = builder
            .build()
            .map_err(|e| TileError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            insecure_tls: config.insecure_tls,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub const fn insecure_tls(&self) -> bool {
        self.insecure_tls
    }

    pub fn url_for(&self, resource: &str) -> String {
        format!("{}/{resource}", self.base_url)
    }

    /// GET a resource, forwarding the raw `Range` header verbatim
    ///
    /// Non-2xx statuses come back as [`TileError::Origin`] and connection
    /// faults as [`TileError::Transport`]. The body is fully buffered.
    pub async fn fetch(&self, resource: &str, range: Option<&str>) -> Result<CacheEntry> {
        let response = self.send(Method::GET, resource, range).await?;
        let status = response.status().as_u16();
        let headers = relayed_headers(&response);
        let body = response.bytes().await?;

        Ok(CacheEntry {
            status,
            headers,
            body,
        })
    }

    /// HEAD a resource: the same status and relayed headers as [`fetch`]
    /// with an empty body and no transfer of archive bytes
    ///
    /// [`fetch`]: OriginClient::fetch
    pub async fn head(&self, resource: &str, range: Option<&str>) -> Result<CacheEntry> {
        let response = self.send(Method::HEAD, resource, range).await?;

        Ok(CacheEntry {
            status: response.status().as_u16(),
            headers: relayed_headers(&response),
            body: Bytes::new(),
        })
    }

    async fn send(&self, method: Method, resource: &str, range: Option<&str>) -> Result<Response> {
        let url = self.url_for(resource);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(range) = range {
            request = request.header("Range", range);
        }

        let response = request.send().await.map_err(|e| {
            logger::log_warning(&format!("{method} {url} failed: {e}"));
            TileError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            logger::log_warning(&format!("Origin returned {status} for {method} {url}"));
            return Err(TileError::Origin {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

/// Retained origin headers, in relay order; empty values are dropped
fn relayed_headers(response: &Response) -> Vec<(String, String)> {
    RELAYED_HEADERS
        .iter()
        .filter_map(|name| {
            let value = response.headers().get(*name)?.to_str().ok()?;
            (!value.is_empty()).then(|| ((*name).to_string(), value.to_string()))
        })
        .collect()
}

#[async_trait]
impl ExistenceProbe for OriginClient {
    async fn exists(&self, resource: &str) -> bool {
        let url = self.url_for(resource);
        match self.client.head(&url).send().await {
            Ok(response) => {
                logger::log_debug(&format!("HEAD {url} -> {}", response.status()));
                response.status().is_success()
            }
            Err(e) => {
                logger::log_debug(&format!("HEAD {url} failed: {e}"));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(base_url: &str) -> OriginClient {
        OriginClient::new(&OriginConfig {
            base_url: base_url.to_string(),
            ..OriginConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_url_for_trims_trailing_slash() {
        let client = client_for("https://build.example.com/");
        assert_eq!(
            client.url_for("20240115.pmtiles"),
            "https://build.example.com/20240115.pmtiles"
        );
    }

    #[test]
    fn test_tls_relaxation_follows_config() {
        assert!(client_for("https://build.example.com").insecure_tls());

        let strict = OriginClient::new(&OriginConfig {
            base_url: "https://build.example.com".to_string(),
            insecure_tls: false,
            ..OriginConfig::default()
        })
        .unwrap();
        assert!(!strict.insecure_tls());
    }

    #[tokio::test]
    async fn test_fetch_forwards_range_and_filters_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/20240115.pmtiles"))
            .and(header("Range", "bytes=0-3"))
            .and(header("User-Agent", "Mozilla/5.0 (pmtiles-proxy)"))
            .respond_with(
                ResponseTemplate::new(206)
                    .insert_header("Content-Type", "application/octet-stream")
                    .insert_header("Content-Range", "bytes 0-3/10")
                    .insert_header("Accept-Ranges", "bytes")
                    .insert_header("ETag", "\"v1\"")
                    .insert_header("X-Amz-Request-Id", "dropped")
                    .set_body_bytes(b"abcd".to_vec()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let entry = client_for(&server.uri())
            .fetch("20240115.pmtiles", Some("bytes=0-3"))
            .await
            .unwrap();

        assert_eq!(entry.status, 206);
        assert_eq!(&entry.body[..], b"abcd");
        let names: Vec<&str> = entry.headers.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            names,
            vec!["Content-Type", "Content-Length", "Content-Range", "Accept-Ranges", "ETag"]
        );
        assert!(entry
            .headers
            .contains(&("Content-Length".to_string(), "4".to_string())));
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client_for(&server.uri())
            .fetch("secret.pmtiles", None)
            .await
            .unwrap_err();
        assert_eq!(err, TileError::Origin { status: 403 });
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_transport_failure() {
        // Bind then drop to get a port with nothing listening
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = client_for(&format!("http://127.0.0.1:{port}"))
            .fetch("a.pmtiles", None)
            .await
            .unwrap_err();
        assert!(matches!(err, TileError::Transport(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_head_relays_headers_without_get() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/20240115.pmtiles"))
            .and(header("Range", "bytes=0-3"))
            .respond_with(
                ResponseTemplate::new(206)
                    .insert_header("Content-Range", "bytes 0-3/10")
                    .insert_header("X-Amz-Request-Id", "dropped"),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let entry = client_for(&server.uri())
            .head("20240115.pmtiles", Some("bytes=0-3"))
            .await
            .unwrap();
        assert_eq!(entry.status, 206);
        assert!(entry.body.is_empty());
        assert!(entry
            .headers
            .contains(&("Content-Range".to_string(), "bytes 0-3/10".to_string())));
        assert!(entry.headers.iter().all(|(k, _)| k != "X-Amz-Request-Id"));
    }

    #[tokio::test]
    async fn test_probe() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/20240115.pmtiles"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        assert!(client.exists("20240115.pmtiles").await);
        assert!(!client.exists("20240114.pmtiles").await);
    }
}
