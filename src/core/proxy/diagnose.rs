//! Two-Phase Chain Diagnosis
//!
//! Attributes a connectivity failure to the correct hop. The two phases run
//! as a strict sequence, never reordered and never parallelized: a broken
//! first hop must never be misreported as a chained-proxy problem.

use tracing::debug;

use crate::core::proxy::endpoint::build_url;
use crate::core::proxy::probe::{ProbeClient, ProbeFailure, REACHABILITY_TARGET_URL};
use crate::core::proxy::types::{
    DiagnosisCode, DiagnosisResult, ProxyEndpoint, DEFAULT_PROBE_TIMEOUT_MS,
};

/// Diagnose which hop of a chain is responsible for a failure.
///
/// Phase 1 probes the local endpoint directly (a plain HTTP request to its
/// host/port; any response, even an error status, proves something is
/// listening). If that fails the chained hop is **not** probed and the
/// result is `LocalFailed`.
///
/// Phase 2 (only when a chained endpoint is declared) probes a well-known
/// external endpoint while routed through the local hop, simulating a
/// request that would continue on to the chained proxy. HTTP 407 on this
/// path is reported as a proxy-authentication failure.
///
/// Raw transport errors never leak: `error` always carries the categorical
/// explanation from `ProbeFailure`.
pub async fn diagnose(
    client: &dyn ProbeClient,
    local: &ProxyEndpoint,
    chained: Option<&ProxyEndpoint>,
) -> DiagnosisResult {
    // Phase 1: is the local endpoint itself answering?
    let local_probe_url = format!("http://{}:{}/", local.host.trim(), local.port);
    if let Err(failure) = client
        .request(&local_probe_url, None, DEFAULT_PROBE_TIMEOUT_MS)
        .await
    {
        debug!(target: "proxylink::diagnose", %failure, "local endpoint probe failed");
        return DiagnosisResult {
            local_ok: false,
            chained_ok: false,
            code: DiagnosisCode::LocalFailed,
            error: Some(failure.to_string()),
        };
    }

    if chained.is_none() {
        return DiagnosisResult {
            local_ok: true,
            chained_ok: true,
            code: DiagnosisCode::LocalOnlyOk,
            error: None,
        };
    }

    // Phase 2: route through the local hop toward a well-known target. The
    // chained endpoint is declared intent only - the external client on the
    // local port performs the second hop, so this is the closest observable
    // signal for it. The chained hop is never dialed from here.
    let proxy_url = build_url(local);
    let outcome = client
        .request(REACHABILITY_TARGET_URL, Some(&proxy_url), DEFAULT_PROBE_TIMEOUT_MS)
        .await;

    match outcome {
        Ok(response) if response.status == 407 => DiagnosisResult {
            local_ok: true,
            chained_ok: false,
            code: DiagnosisCode::ChainedFailed,
            error: Some(ProbeFailure::ProxyAuthRequired.to_string()),
        },
        Ok(_) => DiagnosisResult {
            local_ok: true,
            chained_ok: true,
            code: DiagnosisCode::ChainOk,
            error: None,
        },
        Err(failure) => {
            debug!(target: "proxylink::diagnose", %failure, "routed probe failed");
            DiagnosisResult {
                local_ok: true,
                chained_ok: false,
                code: DiagnosisCode::ChainedFailed,
                error: Some(failure.to_string()),
            }
        }
    }
}
