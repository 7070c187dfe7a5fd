//! Proxy module tests
//!
//! Covers endpoint validation and presets, chain-rule encode/decode,
//! two-phase diagnosis ordering, tunnel application/testing, and the
//! health monitor state machine.

pub mod chain_rule_tests;
pub mod endpoint_tests;
