/*!
proxylink - proxy/tunnel chain subsystem for a desktop network client.

The crate lets a client route traffic through a user-supplied local proxy
(an externally-run mixed SOCKS/HTTP proxy tool) and optionally declare a
second chained upstream hop, while continuously verifying that the path is
alive and attributing failures to the correct hop. It also gates whether an
auxiliary translation subsystem should itself go through a proxy, using a
cached reachability heuristic.

## Components

- `core::proxy::endpoint` - endpoint validation, presets, URL formatting
- `core::proxy::chain_rule` - routing-rule string encode/decode
- `core::proxy::probe` - single timed reachability checks (I/O boundary)
- `core::proxy::diagnose` - two-phase local/chained failure attribution
- `core::proxy::tunnel` - single-hop SOCKS5/HTTP tunnel application
- `core::proxy::health_monitor` - polling state machine with change events
- `core::translation` - conditional proxy selection for translation calls

External collaborators (proxy sessions, HTTP clients) are consumed through
traits so callers can inject their own implementations; production clients
backed by `isahc` are available behind the `network-monitoring` feature.
*/

pub mod core;

pub use crate::core::proxy::chain_rule::{decode, encode, ChainRuleError, DecodedChain, DIRECT_RULE};
pub use crate::core::proxy::diagnose::diagnose;
pub use crate::core::proxy::endpoint::{
    build_url, from_preset, resolve_preset, validate_local, LocalValidation, Preset,
};
pub use crate::core::proxy::health_monitor::{HealthCheckOutcome, HealthMonitor};
pub use crate::core::proxy::probe::{ProbeClient, ProbeFailure, ProbeResponse};
pub use crate::core::proxy::tunnel::{ProxySession, TunnelApplier, TunnelTestReport};
pub use crate::core::proxy::types::*;
pub use crate::core::translation::{
    ProxyMode, Translation, TranslateError, TranslationProxyContext, TranslationProxySelector,
};
