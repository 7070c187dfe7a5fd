//! Proxy Chain and Tunnel Module
//!
//! This module provides the proxy/tunnel chain subsystem with:
//! - Pure endpoint validation, preset resolution, and URL formatting
//! - Chain-rule string construction and parsing (one or two declared hops)
//! - Strict two-phase failure diagnosis attributing errors to the right hop
//! - Single-hop SOCKS5/HTTP tunnel application against a session interface
//! - A polling health-state machine with change notifications

pub mod chain_rule;
pub mod diagnose;
pub mod endpoint;
pub mod health_monitor;
pub mod probe;
pub mod tunnel;
pub mod types;

// Re-export public API
pub use self::chain_rule::{decode, encode, ChainRuleError, DecodedChain, DIRECT_RULE};
pub use self::diagnose::diagnose;
pub use self::endpoint::{
    build_url, from_preset, resolve_preset, validate_local, LocalValidation, Preset,
};
pub use self::health_monitor::{HealthCheckOutcome, HealthMonitor};
pub use self::probe::{ProbeClient, ProbeFailure, ProbeResponse, REACHABILITY_TARGET_URL};
pub use self::tunnel::{ProxySession, SessionError, TunnelApplier, TunnelError, TunnelTestReport};
pub use self::types::*;

// Re-export client implementations conditionally
#[cfg(feature = "network-monitoring")]
pub use self::probe::IsahcProbeClient;

#[cfg(not(feature = "network-monitoring"))]
pub use self::probe::MockProbeClient;
