//! Conditional Proxy Selection for Translation
//!
//! A three-valued mode (`always` / `auto` / `never`) combined with a cached
//! blocked-detection heuristic decides whether translation calls go through
//! the configured proxy. The state lives in an explicit, injectable context
//! owned by the selector - callers hold the selector by reference instead
//! of relying on ambient static state.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::core::proxy::endpoint::build_url;
use crate::core::proxy::probe::ProbeClient;
use crate::core::proxy::types::{ProxyEndpoint, ValidationError, DEFAULT_PROBE_TIMEOUT_MS};
use crate::core::translation::client::{translate_with_proxy, Translation, TranslateError};

#[cfg(feature = "network-monitoring")]
use crate::core::proxy::probe::{IsahcProbeClient, ProbeFailure};

/// Base URL of the translation service, also the blocked-detection target.
pub const TRANSLATION_ENDPOINT: &str = "https://translate.googleapis.com";

/// How long one blocked-detection verdict stays memoized.
pub const BLOCKED_CACHE_TTL: Duration = Duration::from_secs(300);

/// Three-valued proxying mode for the translation subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyMode {
    /// Route every translation call through the proxy
    Always,
    /// Proxy only when the endpoint looks blocked without one
    #[default]
    Auto,
    /// Never proxy; a configured proxy is cleared
    Never,
}

impl fmt::Display for ProxyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyMode::Always => f.write_str("always"),
            ProxyMode::Auto => f.write_str("auto"),
            ProxyMode::Never => f.write_str("never"),
        }
    }
}

impl FromStr for ProxyMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(ProxyMode::Always),
            "auto" => Ok(ProxyMode::Auto),
            "never" => Ok(ProxyMode::Never),
            other => Err(ValidationError::UnknownMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct BlockedCache {
    is_blocked: bool,
    checked_at: Instant,
}

/// Translation proxy state: mode, optional proxy, blocked-detection cache.
///
/// Created with `mode = auto` and no proxy; mutated only through the owning
/// selector's `configure()`/`reset()`.
#[derive(Debug, Default)]
pub struct TranslationProxyContext {
    mode: ProxyMode,
    proxy: Option<ProxyEndpoint>,
    blocked: Option<BlockedCache>,
}

/// Decides whether translation calls should be proxied, and performs them.
pub struct TranslationProxySelector {
    ctx: Mutex<TranslationProxyContext>,
    client: Arc<dyn ProbeClient>,
    timeout_ms: u64,
}

impl TranslationProxySelector {
    /// Create a selector backed by the production isahc probe client
    #[cfg(feature = "network-monitoring")]
    pub fn new() -> Result<Self, ProbeFailure> {
        Ok(Self::with_probe_client(Arc::new(IsahcProbeClient::new()?)))
    }

    /// Create a selector with an injected probe client (used by tests)
    pub fn with_probe_client(client: Arc<dyn ProbeClient>) -> Self {
        Self {
            ctx: Mutex::new(TranslationProxyContext::default()),
            client,
            timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }

    /// Override the probe/translation timeout (for testing)
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Reconfigure mode and proxy.
    ///
    /// The mode string is matched case-insensitively against
    /// `always`/`auto`/`never`. `never` accepts a missing proxy and clears
    /// any stored one; `always` and `auto` require a proxy that passes the
    /// same host/port validation as a local endpoint. Every successful call
    /// resets the blocked-detection cache.
    pub fn configure(
        &self,
        proxy: Option<ProxyEndpoint>,
        mode: &str,
    ) -> Result<(), ValidationError> {
        let mode: ProxyMode = mode.parse()?;

        let proxy = match mode {
            ProxyMode::Never => None,
            ProxyMode::Always | ProxyMode::Auto => {
                let proxy = proxy.ok_or_else(|| ValidationError::ProxyRequired(mode.to_string()))?;
                if proxy.host.trim().is_empty() {
                    return Err(ValidationError::EmptyHost);
                }
                if !proxy.is_local_host() {
                    return Err(ValidationError::HostNotLocal);
                }
                if proxy.port == 0 {
                    return Err(ValidationError::PortOutOfRange);
                }
                Some(proxy)
            }
        };

        let mut ctx = lock(&self.ctx);
        ctx.mode = mode;
        ctx.proxy = proxy;
        ctx.blocked = None;
        Ok(())
    }

    /// Restore the initial state: mode `auto`, no proxy, empty cache
    pub fn reset(&self) {
        *lock(&self.ctx) = TranslationProxyContext::default();
    }

    pub fn mode(&self) -> ProxyMode {
        lock(&self.ctx).mode
    }

    pub fn proxy(&self) -> Option<ProxyEndpoint> {
        lock(&self.ctx).proxy.clone()
    }

    /// Whether translation calls should currently be proxied.
    ///
    /// `always` and `never` answer unconditionally; `auto` consults the
    /// blocked-detection heuristic.
    pub async fn should_use_proxy(&self) -> bool {
        match self.mode() {
            ProxyMode::Always => true,
            ProxyMode::Never => false,
            ProxyMode::Auto => self.detect_blocked().await,
        }
    }

    /// Heuristic guess whether the translation endpoint is blocked without
    /// a proxy. Memoized for five minutes.
    ///
    /// A cache miss triggers one direct reachability probe. Transport-level
    /// failures (refused, timeout, DNS, unreachable) count as blocked; any
    /// other outcome - including a non-2xx HTTP status - counts as not
    /// blocked. A heuristic, explicitly not a guarantee.
    pub async fn detect_blocked(&self) -> bool {
        if let Some(cache) = lock(&self.ctx).blocked {
            if cache.checked_at.elapsed() < BLOCKED_CACHE_TTL {
                return cache.is_blocked;
            }
        }

        let outcome = self
            .client
            .request(TRANSLATION_ENDPOINT, None, self.timeout_ms)
            .await;
        let is_blocked = match outcome {
            Ok(_) => false,
            Err(failure) => failure.is_transport_failure(),
        };
        debug!(target: "proxylink::translation", is_blocked, "blocked-detection probe completed");

        lock(&self.ctx).blocked = Some(BlockedCache {
            is_blocked,
            checked_at: Instant::now(),
        });
        is_blocked
    }

    /// Translate `text` into `target_lang` through `proxy`.
    ///
    /// `source_lang` of `None` requests automatic detection.
    pub async fn translate_with_proxy(
        &self,
        text: &str,
        target_lang: &str,
        proxy: &ProxyEndpoint,
        source_lang: Option<&str>,
    ) -> Result<Translation, TranslateError> {
        translate_with_proxy(
            self.client.as_ref(),
            text,
            target_lang,
            proxy,
            source_lang.unwrap_or("auto"),
            self.timeout_ms,
        )
        .await
    }

    /// Usable proxy URL for outgoing translation requests, or `None`.
    ///
    /// Returns a handle only when `should_use_proxy()` holds and a proxy is
    /// configured and structurally complete.
    pub async fn proxy_agent(&self) -> Option<String> {
        if !self.should_use_proxy().await {
            return None;
        }
        self.proxy()
            .as_ref()
            .map(build_url)
            .filter(|url| !url.is_empty())
    }
}

/// The selector never holds a guard across an await, so a poisoned lock
/// only ever wraps consistent state.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
