//! Endpoint Validation, Presets, and URL Formatting
//!
//! Pure functions with no I/O: everything here underlies the input checking
//! of the other proxy components.
//!
//! - Local-endpoint validation with independent host/port error accumulation
//! - A fixed catalog of proxy-client presets resolved case-insensitively
//! - Proxy URL formatting with percent-encoded credentials

use crate::core::proxy::types::{
    ProxyEndpoint, ProxyProtocol, ValidationError, LOCAL_HOSTS,
};

/// One entry in the fixed preset catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub id: &'static str,
    pub host: &'static str,
    pub port: u16,
    pub protocol: ProxyProtocol,
}

impl Preset {
    pub fn endpoint(&self) -> ProxyEndpoint {
        ProxyEndpoint::new(self.host, self.port, self.protocol)
    }
}

/// Fixed, immutable preset catalog: three common proxy-client defaults plus
/// the `custom` placeholder (port 0 means "fill in your own").
pub const PRESETS: [Preset; 4] = [
    Preset {
        id: "clash",
        host: "127.0.0.1",
        port: 7890,
        protocol: ProxyProtocol::Http,
    },
    Preset {
        id: "v2rayn",
        host: "127.0.0.1",
        port: 10808,
        protocol: ProxyProtocol::Http,
    },
    Preset {
        id: "shadowsocks",
        host: "127.0.0.1",
        port: 1080,
        protocol: ProxyProtocol::Socks5,
    },
    Preset {
        id: "custom",
        host: "127.0.0.1",
        port: 0,
        protocol: ProxyProtocol::Http,
    },
];

/// Outcome of `validate_local`: host and port problems are reported together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalValidation {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validate a user-supplied local endpoint.
///
/// Host and port are checked independently so a form can show both problems
/// at once. The host must be `127.0.0.1` or `localhost` (case-insensitive);
/// the port must parse as an integer in `[1, 65535]` (numeric strings are
/// coerced, anything else fails).
pub fn validate_local(host: &str, port: &str) -> LocalValidation {
    let mut errors = Vec::new();

    let host = host.trim();
    if host.is_empty() {
        errors.push(ValidationError::EmptyHost);
    } else if !LOCAL_HOSTS.iter().any(|h| h.eq_ignore_ascii_case(host)) {
        errors.push(ValidationError::HostNotLocal);
    }

    match port.trim().parse::<u32>() {
        Ok(p) if (1..=65_535).contains(&p) => {}
        _ => errors.push(ValidationError::PortOutOfRange),
    }

    LocalValidation {
        valid: errors.is_empty(),
        errors,
    }
}

/// Resolve a preset by id, case-insensitively.
///
/// Unknown ids yield `None`, never an error.
pub fn resolve_preset(id: &str) -> Option<&'static Preset> {
    let id = id.trim();
    PRESETS.iter().find(|p| p.id.eq_ignore_ascii_case(id))
}

/// Build a local endpoint from a preset.
///
/// `custom_port` is substituted only for the `custom` preset; the fixed
/// ports of the named presets are never overridden.
pub fn from_preset(id: &str, custom_port: Option<u16>) -> Option<ProxyEndpoint> {
    let preset = resolve_preset(id)?;
    let mut endpoint = preset.endpoint();
    if preset.id == "custom" {
        if let Some(port) = custom_port {
            endpoint.port = port;
        }
    }
    Some(endpoint)
}

/// Format an endpoint as `protocol://[user:pass@]host:port`.
///
/// Credentials are percent-encoded. A structurally incomplete endpoint
/// (empty host or port 0) formats to an empty string rather than erroring;
/// callers must check for emptiness.
pub fn build_url(endpoint: &ProxyEndpoint) -> String {
    if !endpoint.is_complete() {
        return String::new();
    }

    let host = endpoint.host.trim();
    match &endpoint.credentials {
        Some(creds) => format!(
            "{}://{}:{}@{}:{}",
            endpoint.protocol,
            urlencoding::encode(&creds.username),
            urlencoding::encode(&creds.password),
            host,
            endpoint.port
        ),
        None => format!("{}://{}:{}", endpoint.protocol, host, endpoint.port),
    }
}
