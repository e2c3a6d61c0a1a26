//! HTTP fetch pipeline for the eCFR APIs.
//!
//! ### Status handling
//! - Any HTTP status is returned as a `FetchResponse`; callers decide what a
//!   non-200 means (the title service turns it into a failure payload).
//! - Only transport problems are errors: timeouts become `FETCH_TIMEOUT`,
//!   everything else `HTTP_ERROR`.
//!
//! ### Connection ceiling
//! - At most `max_connections` requests are in flight at once; extra callers
//!   wait for a permit. Fan-out above this layer is unbounded.

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode, header};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

pub use self::url::{UrlError, normalize_base_url};

use ecfr_core::{AppConfig, Error};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "ecfr-counts/0.1")
    pub user_agent: String,

    /// Request timeout (default: 30s)
    pub timeout: Duration,

    /// Maximum simultaneous requests (default: 1)
    pub max_connections: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "ecfr-counts/0.1".to_string(), timeout: Duration::from_secs(30), max_connections: 1 }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            max_connections: config.max_connections,
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The URL requested
    pub url: String,
    /// HTTP status code
    pub status: StatusCode,
    /// Response body bytes
    pub body: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl FetchResponse {
    /// Build a response without transport metadata.
    pub fn new(url: impl Into<String>, status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self { url: url.into(), status, body: body.into(), fetch_ms: 0 }
    }

    /// Whether the upstream answered 200 OK.
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body decoded as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body)
            .map_err(|e| Error::Serialization(format!("invalid JSON from {}: {}", self.url, e)))
    }
}

/// Outbound GET requests.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// GET `url`. `timeout` overrides the client-wide default for this request.
    async fn fetch(&self, url: &str, timeout: Option<Duration>) -> Result<FetchResponse, Error>;
}

/// HTTP fetch client with a connection ceiling.
#[derive(Debug)]
pub struct FetchClient {
    http: Client,
    permits: Semaphore,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: &FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.max_connections)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        let permits = Semaphore::new(config.max_connections.max(1));

        Ok(Self { http, permits })
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(url.to_string())
    } else {
        Error::HttpError(format!("network error for {}: {}", url, err))
    }
}

#[async_trait]
impl Fetch for FetchClient {
    async fn fetch(&self, url: &str, timeout: Option<Duration>) -> Result<FetchResponse, Error> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| Error::HttpError(format!("connection pool closed: {}", e)))?;

        let start = Instant::now();
        let mut request = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json, application/xml;q=0.9, */*;q=0.8");
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| transport_error(url, e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| transport_error(url, e))?;
        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!("fetched {} -> {} in {}ms ({} bytes)", url, status.as_u16(), fetch_ms, body.len());

        Ok(FetchResponse { url: url.to_string(), status, body, fetch_ms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "ecfr-counts/0.1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_connections, 1);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { max_connections: 4, timeout_ms: 1_500, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.timeout, Duration::from_millis(1_500));
    }

    #[test]
    fn test_fetch_response_helpers() {
        let response = FetchResponse::new("https://example.com/titles.json", StatusCode::OK, r#"{"n": 7}"#);
        assert!(response.is_ok());
        assert_eq!(response.text(), r#"{"n": 7}"#);

        #[derive(Deserialize)]
        struct Body {
            n: u32,
        }
        let body: Body = response.json().unwrap();
        assert_eq!(body.n, 7);
    }

    #[test]
    fn test_fetch_response_not_ok() {
        let response = FetchResponse::new("https://example.com", StatusCode::TOO_MANY_REQUESTS, "");
        assert!(!response.is_ok());
        assert!(matches!(response.json::<u32>(), Err(Error::Serialization(_))));
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(&FetchConfig::default());
        assert!(client.is_ok());
    }
}
