//! Single-Hop Tunnel Application
//!
//! The simpler alternative to the two-hop chain path: a SOCKS5 or HTTP
//! tunnel applied directly to a session. The session is an external
//! collaborator consumed through the `ProxySession` trait; this module only
//! builds the rule, validates the config, and wires the one-shot
//! authentication handler.

use tracing::debug;

use crate::core::proxy::chain_rule::DIRECT_RULE;
use crate::core::proxy::endpoint::build_url;
use crate::core::proxy::probe::{ProbeClient, ProbeFailure, REACHABILITY_TARGET_URL};
use crate::core::proxy::types::{
    ProxyCredentials, ProxyEndpoint, ProxyProtocol, TunnelConfig, TunnelType, ValidationError,
};

/// Handler answering a session's proxy-authentication challenge
pub type AuthChallengeHandler = Box<dyn Fn() -> ProxyCredentials + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session rejected proxy rule: {0}")]
    Rejected(String),
}

/// Network session interface (consumed, not implemented here).
///
/// `set_auth_challenge_handler` follows replace-not-stack semantics: a new
/// handler displaces any previously registered one, and `None` clears the
/// slot. Implementations must guard the slot so a handler registered for an
/// old configuration cannot answer a challenge raised after reconfiguration.
#[async_trait::async_trait]
pub trait ProxySession: Send + Sync {
    /// Route the session's traffic through `rule`, or directly for `"direct"`
    async fn set_proxy_rule(&self, rule: &str) -> Result<(), SessionError>;

    /// Replace the proxy-authentication challenge handler
    fn set_auth_challenge_handler(&self, handler: Option<AuthChallengeHandler>);
}

#[derive(Debug, thiserror::Error)]
pub enum TunnelError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Outcome of `TunnelApplier::test`.
///
/// `full_probe` is the capability flag for the deliberate SOCKS5/HTTP
/// asymmetry: for `http` tunnels a real request is sent through the tunnel,
/// for `socks5` only the configuration is validated and `note` says so
/// explicitly. The gap is surfaced, never silently "fixed".
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TunnelTestReport {
    pub success: bool,
    /// Whether a real connectivity probe was attempted
    pub full_probe: bool,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
    pub note: Option<String>,
}

/// Applies and tests single-hop tunnels against a session
pub struct TunnelApplier;

impl TunnelApplier {
    /// Validate a tunnel configuration without touching a session.
    ///
    /// Checks: host non-empty, port in range, password present whenever a
    /// username is given. The tunnel type is enforced by construction.
    pub fn validate(config: &TunnelConfig) -> Result<(), ValidationError> {
        if config.host.trim().is_empty() {
            return Err(ValidationError::EmptyHost);
        }
        if config.port == 0 {
            return Err(ValidationError::PortOutOfRange);
        }
        match (&config.username, &config.password) {
            (Some(user), password) if !user.trim().is_empty() => {
                if password.as_deref().map_or(true, |p| p.is_empty()) {
                    return Err(ValidationError::PasswordRequired);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Protocol-specific routing rule for a validated config.
    ///
    /// HTTP tunnels pin both http and https traffic to the same endpoint via
    /// the dual `http=host:port;https=host:port` form.
    pub fn build_rule(config: &TunnelConfig) -> String {
        let host = config.host.trim();
        match config.tunnel_type {
            TunnelType::Socks5 => format!("socks5://{}:{}", host, config.port),
            TunnelType::Http => format!(
                "http={host}:{port};https={host}:{port}",
                host = host,
                port = config.port
            ),
        }
    }

    /// Apply a tunnel configuration to a session.
    ///
    /// A disabled config reverts the session to a direct connection and
    /// unconditionally succeeds. An enabled config is validated, applied,
    /// and - when credentials are supplied - a handler answering the
    /// session's authentication challenge is registered, replacing any
    /// previously registered handler.
    pub async fn apply(session: &dyn ProxySession, config: &TunnelConfig) -> Result<(), TunnelError> {
        if !config.enabled {
            session.set_proxy_rule(DIRECT_RULE).await?;
            return Ok(());
        }

        Self::validate(config)?;

        let rule = Self::build_rule(config);
        debug!(target: "proxylink::tunnel", %rule, "applying tunnel rule");
        session.set_proxy_rule(&rule).await?;

        match (&config.username, &config.password) {
            (Some(username), Some(password)) if !username.trim().is_empty() => {
                let credentials = ProxyCredentials {
                    username: username.clone(),
                    password: password.clone(),
                };
                session.set_auth_challenge_handler(Some(Box::new(move || credentials.clone())));
            }
            _ => session.set_auth_challenge_handler(None),
        }

        Ok(())
    }

    /// Test a tunnel configuration without applying it.
    ///
    /// `http`: issues a real request through the tunnel and requires a
    /// 2xx-3xx response. `socks5`: configuration validation only; the
    /// report says a connectivity probe was not attempted (`full_probe`
    /// false). Connectivity failures come back inside the report, never as
    /// an `Err`.
    pub async fn test(
        client: &dyn ProbeClient,
        config: &TunnelConfig,
        timeout_ms: u64,
    ) -> TunnelTestReport {
        if let Err(error) = Self::validate(config) {
            return TunnelTestReport {
                success: false,
                full_probe: false,
                latency_ms: None,
                error: Some(error.to_string()),
                note: None,
            };
        }

        match config.tunnel_type {
            TunnelType::Socks5 => TunnelTestReport {
                success: true,
                full_probe: false,
                latency_ms: None,
                error: None,
                note: Some(
                    "configuration validated; connectivity over socks5 was not probed".to_string(),
                ),
            },
            TunnelType::Http => {
                let proxy_url = build_url(&tunnel_proxy_endpoint(config));
                match client
                    .request(REACHABILITY_TARGET_URL, Some(&proxy_url), timeout_ms)
                    .await
                {
                    Ok(response) if response.status == 407 => TunnelTestReport {
                        success: false,
                        full_probe: true,
                        latency_ms: Some(response.latency.as_millis() as u64),
                        error: Some(ProbeFailure::ProxyAuthRequired.to_string()),
                        note: None,
                    },
                    Ok(response) if response.is_success() => TunnelTestReport {
                        success: true,
                        full_probe: true,
                        latency_ms: Some(response.latency.as_millis() as u64),
                        error: None,
                        note: None,
                    },
                    Ok(response) => TunnelTestReport {
                        success: false,
                        full_probe: true,
                        latency_ms: Some(response.latency.as_millis() as u64),
                        error: Some(format!("unexpected HTTP status {}", response.status)),
                        note: None,
                    },
                    Err(failure) => TunnelTestReport {
                        success: false,
                        full_probe: true,
                        latency_ms: None,
                        error: Some(failure.to_string()),
                        note: None,
                    },
                }
            }
        }
    }
}

/// Endpoint view of a tunnel config, for URL formatting
fn tunnel_proxy_endpoint(config: &TunnelConfig) -> ProxyEndpoint {
    let protocol = match config.tunnel_type {
        TunnelType::Socks5 => ProxyProtocol::Socks5,
        TunnelType::Http => ProxyProtocol::Http,
    };
    let mut endpoint = ProxyEndpoint::new(config.host.trim(), config.port, protocol);
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        if !username.trim().is_empty() {
            endpoint = endpoint.with_credentials(username.clone(), password.clone());
        }
    }
    endpoint
}
