//! Core types for the proxy/tunnel chain subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default timeout for a single reachability probe.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval for the health monitor.
pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 60_000;

/// Lower bound accepted by `HealthMonitor::set_check_interval`.
pub const MIN_CHECK_INTERVAL_MS: u64 = 1_000;

/// Hosts accepted for a *local* proxy endpoint (case-insensitive).
pub const LOCAL_HOSTS: [&str; 2] = ["127.0.0.1", "localhost"];

/// Protocols supported by chain and tunnel endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

impl ProxyProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks5 => "socks5",
        }
    }
}

impl fmt::Display for ProxyProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProxyProtocol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(ProxyProtocol::Http),
            "https" => Ok(ProxyProtocol::Https),
            "socks5" => Ok(ProxyProtocol::Socks5),
            other => Err(ValidationError::UnknownProtocol(other.to_string())),
        }
    }
}

/// Username/password pair a proxy may demand during an auth challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

/// One proxy hop: a host/port/protocol triple with optional credentials.
///
/// Port 0 is the structural "not filled in yet" placeholder (used by the
/// `custom` preset); such endpoints are incomplete and format to an empty
/// URL rather than erroring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyEndpoint {
    pub host: String,
    pub port: u16,
    pub protocol: ProxyProtocol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<ProxyCredentials>,
}

impl ProxyEndpoint {
    pub fn new(host: impl Into<String>, port: u16, protocol: ProxyProtocol) -> Self {
        Self {
            host: host.into(),
            port,
            protocol,
            credentials: None,
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(ProxyCredentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Structurally complete: non-empty host and a non-zero port.
    pub fn is_complete(&self) -> bool {
        !self.host.trim().is_empty() && self.port != 0
    }

    /// Whether the host is one of the accepted loopback names.
    pub fn is_local_host(&self) -> bool {
        let host = self.host.trim();
        LOCAL_HOSTS.iter().any(|h| h.eq_ignore_ascii_case(host))
    }
}

/// A configured chain: mandatory local hop plus optional declared upstream.
///
/// The chained hop is *declared intent* only - the session layer is always
/// pointed at the local endpoint as its one exit point, and the external
/// proxy client listening there is expected to perform the second hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub local: ProxyEndpoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chained: Option<ProxyEndpoint>,
}

/// Health monitor status levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Monitor is not running
    #[default]
    Disconnected,
    /// Monitor started, first check not yet completed
    Connecting,
    /// Last check reached the endpoint
    Connected,
    /// Last check failed
    Error,
}

/// Read-only view of a monitor's current state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub status: HealthStatus,
    /// Local timezone ISO-8601 timestamp of the last completed check
    pub last_check_at: Option<String>,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

/// Payload delivered to the change callback when the status flips
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthChange {
    pub previous: HealthStatus,
    pub current: HealthStatus,
    pub timestamp: String,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

/// Which hop a connectivity failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosisCode {
    /// The local endpoint did not answer; the chained hop was not probed
    LocalFailed,
    /// The local endpoint answered but the routed probe failed
    ChainedFailed,
    /// Local endpoint reachable, no chained hop configured
    LocalOnlyOk,
    /// Both the local hop and the routed probe succeeded
    ChainOk,
}

/// Result of one two-phase chain diagnosis; produced fresh on every call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub local_ok: bool,
    pub chained_ok: bool,
    pub code: DiagnosisCode,
    pub error: Option<String>,
}

/// Tunnel transport types (the single-hop alternative to the chain path)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TunnelType {
    Socks5,
    Http,
}

impl fmt::Display for TunnelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TunnelType::Socks5 => f.write_str("socks5"),
            TunnelType::Http => f.write_str("http"),
        }
    }
}

impl FromStr for TunnelType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "socks5" => Ok(TunnelType::Socks5),
            "http" => Ok(TunnelType::Http),
            other => Err(ValidationError::UnknownTunnelType(other.to_string())),
        }
    }
}

/// Single-hop tunnel configuration applied directly to a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelConfig {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub tunnel_type: TunnelType,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Health monitor target configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_check_interval")]
    pub check_interval_ms: u64,
}

impl MonitorConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            check_interval_ms: DEFAULT_CHECK_INTERVAL_MS,
        }
    }
}

fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL_MS
}

/// Malformed-input errors, surfaced synchronously at the call boundary.
///
/// Connectivity failures are never reported through this type; they travel
/// inside result structures (see `probe::ProbeFailure`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("host must not be empty")]
    EmptyHost,
    #[error("host must be 127.0.0.1 or localhost")]
    HostNotLocal,
    #[error("port must be an integer between 1 and 65535")]
    PortOutOfRange,
    #[error("unknown proxy protocol: {0}")]
    UnknownProtocol(String),
    #[error("unknown tunnel type: {0}")]
    UnknownTunnelType(String),
    #[error("unknown proxy mode: {0}")]
    UnknownMode(String),
    #[error("password is required when a username is set")]
    PasswordRequired,
    #[error("a proxy endpoint is required for mode '{0}'")]
    ProxyRequired(String),
    #[error("proxy endpoint is structurally incomplete")]
    IncompleteEndpoint,
    #[error("text to translate must not be empty")]
    EmptyText,
    #[error("target language must not be empty")]
    EmptyTargetLang,
    #[error("check interval must be at least {MIN_CHECK_INTERVAL_MS} ms")]
    IntervalTooShort,
}

/// Fatal configuration errors from `HealthMonitor::start`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("monitor config requires a non-empty host")]
    MissingHost,
    #[error("monitor config requires a non-zero port")]
    MissingPort,
    #[error("monitor is not running")]
    NotRunning,
}

/// Generate standardized local timezone ISO-8601 timestamp
///
/// All user-visible timestamps (snapshots, change events) use this format,
/// e.g. `"2025-01-25T10:30:45-08:00"`.
pub fn get_local_timestamp() -> String {
    let now: chrono::DateTime<chrono::Local> = std::time::SystemTime::now().into();
    now.to_rfc3339()
}
