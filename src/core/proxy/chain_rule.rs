//! Chain Rule Construction and Parsing
//!
//! Builds and parses the routing-rule string that represents one or two
//! chained hops. The encoded forms are:
//!
//! - `"direct"` - no proxying (local endpoint structurally invalid)
//! - `"<localUrl>"` - one hop
//! - `"<localUrl>;<chainedUrl>"` - two declared hops
//!
//! The semicolon-joined form communicates *intent* only: the session layer
//! is still pointed at the local endpoint as its single exit point, and the
//! external client listening there is expected to dial the second hop.

use url::Url;

use crate::core::proxy::endpoint::build_url;
use crate::core::proxy::types::{ChainConfig, ProxyEndpoint, ProxyProtocol};

/// Sentinel rule meaning "revert to a direct connection".
pub const DIRECT_RULE: &str = "direct";

#[derive(Debug, thiserror::Error)]
pub enum ChainRuleError {
    #[error("invalid proxy URL in rule: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unsupported scheme in rule: {0}")]
    UnsupportedScheme(String),
    #[error("proxy URL is missing a host")]
    MissingHost,
    #[error("proxy URL is missing a port")]
    MissingPort,
    #[error("proxy URL credentials are not valid percent-encoded UTF-8")]
    BadCredentials,
}

/// Decoded counterpart of an encoded rule; `"direct"` decodes to two `None`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedChain {
    pub local: Option<ProxyEndpoint>,
    pub chained: Option<ProxyEndpoint>,
}

/// Encode one or two hops into a routing-rule string.
///
/// A structurally incomplete `local` yields the `"direct"` sentinel. An
/// absent or incomplete `chained` yields just the local URL.
pub fn encode(local: &ProxyEndpoint, chained: Option<&ProxyEndpoint>) -> String {
    let local_url = build_url(local);
    if local_url.is_empty() {
        return DIRECT_RULE.to_string();
    }

    match chained.map(build_url) {
        Some(chained_url) if !chained_url.is_empty() => {
            format!("{};{}", local_url, chained_url)
        }
        _ => local_url,
    }
}

/// Decode a routing-rule string back into its endpoints.
///
/// Inverse of `encode` for the `";"`-joined and single-URL forms:
/// `decode(encode(l, c))` recovers `l` and, if present, `c` field-for-field
/// including percent-decoded credentials.
pub fn decode(rule: &str) -> Result<DecodedChain, ChainRuleError> {
    let rule = rule.trim();
    if rule.is_empty() || rule.eq_ignore_ascii_case(DIRECT_RULE) {
        return Ok(DecodedChain {
            local: None,
            chained: None,
        });
    }

    let mut parts = rule.splitn(2, ';');
    let local = parts
        .next()
        .map(parse_endpoint_url)
        .transpose()?;
    let chained = parts.next().map(parse_endpoint_url).transpose()?;

    Ok(DecodedChain { local, chained })
}

impl ChainConfig {
    /// Routing rule for this chain, ready to hand to a session.
    pub fn rule(&self) -> String {
        encode(&self.local, self.chained.as_ref())
    }
}

fn parse_endpoint_url(raw: &str) -> Result<ProxyEndpoint, ChainRuleError> {
    let parsed = Url::parse(raw.trim())?;

    let protocol: ProxyProtocol = parsed
        .scheme()
        .parse()
        .map_err(|_| ChainRuleError::UnsupportedScheme(parsed.scheme().to_string()))?;
    let host = parsed
        .host_str()
        .ok_or(ChainRuleError::MissingHost)?
        .to_string();
    // port() hides scheme-default ports, so fall back to the known default
    let port = parsed
        .port_or_known_default()
        .ok_or(ChainRuleError::MissingPort)?;

    let mut endpoint = ProxyEndpoint::new(host, port, protocol);
    if !parsed.username().is_empty() {
        let username = urlencoding::decode(parsed.username())
            .map_err(|_| ChainRuleError::BadCredentials)?;
        let password = urlencoding::decode(parsed.password().unwrap_or(""))
            .map_err(|_| ChainRuleError::BadCredentials)?;
        endpoint = endpoint.with_credentials(username, password);
    }

    Ok(endpoint)
}
