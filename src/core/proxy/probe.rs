//! Connectivity Probe Client
//!
//! Thin I/O boundary issuing one timed reachability check, optionally routed
//! through a proxy endpoint. Everything above this module (diagnosis, health
//! monitoring, translation gating) consumes the `ProbeClient` trait so tests
//! can inject scripted clients.

use std::time::Duration;

#[cfg(feature = "network-monitoring")]
use std::time::Instant;

#[cfg(feature = "network-monitoring")]
use isahc::config::{Configurable, RedirectPolicy};
#[cfg(feature = "network-monitoring")]
use isahc::{AsyncReadResponseExt, HttpClient, Request};

/// Well-known external endpoint used for routed reachability checks.
pub const REACHABILITY_TARGET_URL: &str = "http://www.gstatic.com/generate_204";

/// Categorical connectivity failures.
///
/// `Display` carries the user-facing explanation for each category; raw
/// transport error text only survives inside `Other`. These values are
/// returned inside result structures, never panicked or retried here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeFailure {
    #[error("connection refused: the endpoint is not accepting connections")]
    ConnectionRefused,
    #[error("the request timed out before the endpoint responded")]
    Timeout,
    #[error("DNS resolution failed for the endpoint host")]
    DnsFailure,
    #[error("the proxy requires authentication (HTTP 407)")]
    ProxyAuthRequired,
    #[error("the network is unreachable")]
    Unreachable,
    #[error("{0}")]
    Other(String),
}

impl ProbeFailure {
    /// Transport-level failure classes that indicate the target could not be
    /// reached at all (used by blocked-detection).
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            ProbeFailure::ConnectionRefused
                | ProbeFailure::Timeout
                | ProbeFailure::DnsFailure
                | ProbeFailure::Unreachable
        )
    }
}

/// Response from a single probe request
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub latency: Duration,
}

impl ProbeResponse {
    /// 2xx-3xx, the range tunnel tests require
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

/// HTTP client abstraction for reachability checks
///
/// # Implementation Requirements
/// * Must use GET and must not follow redirects
/// * `proxy` is a complete proxy URL (`http://...` or `socks5://...`);
///   `None` means a direct connection
/// * Transport failures must map to `ProbeFailure` categories; an HTTP
///   error status is a *response*, not a failure
#[async_trait::async_trait]
pub trait ProbeClient: Send + Sync {
    async fn request(
        &self,
        url: &str,
        proxy: Option<&str>,
        timeout_ms: u64,
    ) -> Result<ProbeResponse, ProbeFailure>;
}

/// Production probe client backed by isahc
#[cfg(feature = "network-monitoring")]
pub struct IsahcProbeClient {
    client: HttpClient,
}

#[cfg(feature = "network-monitoring")]
impl IsahcProbeClient {
    pub fn new() -> Result<Self, ProbeFailure> {
        let client = HttpClient::builder()
            .redirect_policy(RedirectPolicy::None)
            .build()
            .map_err(|e| ProbeFailure::Other(format!("failed to create probe client: {}", e)))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "network-monitoring")]
#[async_trait::async_trait]
impl ProbeClient for IsahcProbeClient {
    async fn request(
        &self,
        url: &str,
        proxy: Option<&str>,
        timeout_ms: u64,
    ) -> Result<ProbeResponse, ProbeFailure> {
        let start = Instant::now();

        let mut builder = Request::get(url)
            .timeout(Duration::from_millis(timeout_ms))
            .redirect_policy(RedirectPolicy::None)
            .header("Accept", "*/*");

        if let Some(proxy_url) = proxy {
            let proxy_uri = proxy_url
                .parse::<isahc::http::Uri>()
                .map_err(|e| ProbeFailure::Other(format!("invalid proxy URL: {}", e)))?;
            builder = builder.proxy(Some(proxy_uri));
        }

        let request = builder
            .body(Vec::new())
            .map_err(|e| ProbeFailure::Other(format!("request creation failed: {}", e)))?;

        let mut response = self
            .client
            .send_async(request)
            .await
            .map_err(|e| classify_isahc_error(&e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProbeFailure::Other(format!("failed to read response body: {}", e)))?
            .to_vec();

        Ok(ProbeResponse {
            status,
            body,
            latency: start.elapsed(),
        })
    }
}

#[cfg(feature = "network-monitoring")]
fn classify_isahc_error(error: &isahc::Error) -> ProbeFailure {
    use isahc::error::ErrorKind;

    match error.kind() {
        ErrorKind::ConnectionFailed => ProbeFailure::ConnectionRefused,
        ErrorKind::Timeout => ProbeFailure::Timeout,
        ErrorKind::NameResolution => ProbeFailure::DnsFailure,
        ErrorKind::Io => ProbeFailure::Unreachable,
        _ => ProbeFailure::Other(error.to_string()),
    }
}

/// Mock probe client when the network-monitoring feature is disabled
#[cfg(not(feature = "network-monitoring"))]
#[derive(Default)]
pub struct MockProbeClient;

#[cfg(not(feature = "network-monitoring"))]
#[async_trait::async_trait]
impl ProbeClient for MockProbeClient {
    async fn request(
        &self,
        _url: &str,
        _proxy: Option<&str>,
        _timeout_ms: u64,
    ) -> Result<ProbeResponse, ProbeFailure> {
        Ok(ProbeResponse {
            status: 204,
            body: Vec::new(),
            latency: Duration::from_millis(50),
        })
    }
}
