//! Tests for conditional proxy selection and proxied translation calls

use std::sync::Arc;

use crate::common::{response, response_with_body, ScriptedProbeClient};
use proxylink::core::proxy::probe::ProbeFailure;
use proxylink::core::translation::selector::{
    ProxyMode, TranslationProxySelector, TRANSLATION_ENDPOINT,
};
use proxylink::{ProxyEndpoint, ProxyProtocol, TranslateError, ValidationError};

fn local_proxy() -> ProxyEndpoint {
    ProxyEndpoint::new("127.0.0.1", 7890, ProxyProtocol::Http)
}

fn selector(client: ScriptedProbeClient) -> (TranslationProxySelector, Arc<ScriptedProbeClient>) {
    let client = Arc::new(client);
    let selector = TranslationProxySelector::with_probe_client(client.clone());
    (selector, client)
}

#[tokio::test]
async fn configure_parses_mode_case_insensitively() {
    let (selector, _) = selector(ScriptedProbeClient::ok(200));

    selector.configure(Some(local_proxy()), "ALWAYS").unwrap();
    assert_eq!(selector.mode(), ProxyMode::Always);

    selector.configure(Some(local_proxy()), " Auto ").unwrap();
    assert_eq!(selector.mode(), ProxyMode::Auto);

    selector.configure(None, "never").unwrap();
    assert_eq!(selector.mode(), ProxyMode::Never);

    assert_eq!(
        selector.configure(None, "sometimes"),
        Err(ValidationError::UnknownMode("sometimes".to_string()))
    );
}

#[tokio::test]
async fn never_mode_clears_any_stored_proxy() {
    let (selector, _) = selector(ScriptedProbeClient::ok(200));

    selector.configure(Some(local_proxy()), "always").unwrap();
    assert!(selector.proxy().is_some());

    selector.configure(Some(local_proxy()), "never").unwrap();
    assert!(selector.proxy().is_none());
}

#[tokio::test]
async fn always_and_auto_require_a_valid_local_proxy() {
    let (selector, _) = selector(ScriptedProbeClient::ok(200));

    assert_eq!(
        selector.configure(None, "always"),
        Err(ValidationError::ProxyRequired("always".to_string()))
    );
    assert_eq!(
        selector.configure(None, "auto"),
        Err(ValidationError::ProxyRequired("auto".to_string()))
    );

    let remote = ProxyEndpoint::new("example.com", 7890, ProxyProtocol::Http);
    assert_eq!(
        selector.configure(Some(remote), "always"),
        Err(ValidationError::HostNotLocal)
    );

    let no_port = ProxyEndpoint::new("127.0.0.1", 0, ProxyProtocol::Http);
    assert_eq!(
        selector.configure(Some(no_port), "auto"),
        Err(ValidationError::PortOutOfRange)
    );

    // a failed configure leaves the previous state intact
    assert_eq!(selector.mode(), ProxyMode::Auto);
    assert!(selector.proxy().is_none());
}

#[tokio::test]
async fn always_and_never_answer_without_probing() {
    let (selector, client) = selector(ScriptedProbeClient::ok(200));

    selector.configure(Some(local_proxy()), "always").unwrap();
    assert!(selector.should_use_proxy().await);

    selector.configure(None, "never").unwrap();
    assert!(!selector.should_use_proxy().await);

    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn auto_mode_probes_once_and_caches_the_verdict() {
    let (selector, client) =
        selector(ScriptedProbeClient::err(ProbeFailure::ConnectionRefused));
    selector.configure(Some(local_proxy()), "auto").unwrap();

    assert!(selector.should_use_proxy().await);
    assert!(selector.should_use_proxy().await);
    assert!(selector.detect_blocked().await);

    // the verdict was memoized after the first probe
    assert_eq!(client.call_count(), 1);
    assert_eq!(client.calls()[0].0, TRANSLATION_ENDPOINT);
    assert_eq!(client.calls()[0].1, None);
}

#[tokio::test]
async fn configure_resets_the_blocked_cache() {
    let (selector, client) = selector(ScriptedProbeClient::err(ProbeFailure::Timeout));
    selector.configure(Some(local_proxy()), "auto").unwrap();

    assert!(selector.detect_blocked().await);

    client.set_default(Ok(response(200)));
    selector.configure(Some(local_proxy()), "auto").unwrap();

    assert!(!selector.detect_blocked().await);
    assert_eq!(client.call_count(), 2);
}

#[tokio::test]
async fn http_error_status_does_not_count_as_blocked() {
    let (selector, _) = selector(ScriptedProbeClient::ok(403));
    selector.configure(Some(local_proxy()), "auto").unwrap();
    assert!(!selector.detect_blocked().await);
}

#[tokio::test]
async fn non_transport_failures_do_not_count_as_blocked() {
    let (selector, _) = selector(ScriptedProbeClient::err(ProbeFailure::Other(
        "tls handshake rejected".to_string(),
    )));
    selector.configure(Some(local_proxy()), "auto").unwrap();
    assert!(!selector.detect_blocked().await);
}

#[tokio::test]
async fn reset_restores_the_initial_state() {
    let (selector, _) = selector(ScriptedProbeClient::ok(200));
    selector.configure(Some(local_proxy()), "always").unwrap();

    selector.reset();

    assert_eq!(selector.mode(), ProxyMode::Auto);
    assert!(selector.proxy().is_none());
}

#[tokio::test]
async fn proxy_agent_requires_both_a_verdict_and_a_proxy() {
    let (selector, _) = selector(ScriptedProbeClient::err(ProbeFailure::ConnectionRefused));

    selector.configure(Some(local_proxy()), "always").unwrap();
    assert_eq!(
        selector.proxy_agent().await.as_deref(),
        Some("http://127.0.0.1:7890")
    );

    selector.configure(None, "never").unwrap();
    assert_eq!(selector.proxy_agent().await, None);
}

#[tokio::test]
async fn translate_rejects_bad_input_before_any_io() {
    let (selector, client) = selector(ScriptedProbeClient::ok(200));

    let result = selector
        .translate_with_proxy("  ", "fr", &local_proxy(), None)
        .await;
    assert_eq!(
        result,
        Err(TranslateError::Invalid(ValidationError::EmptyText))
    );

    let result = selector
        .translate_with_proxy("hello", "", &local_proxy(), None)
        .await;
    assert_eq!(
        result,
        Err(TranslateError::Invalid(ValidationError::EmptyTargetLang))
    );

    let incomplete = ProxyEndpoint::new("127.0.0.1", 0, ProxyProtocol::Http);
    let result = selector
        .translate_with_proxy("hello", "fr", &incomplete, None)
        .await;
    assert_eq!(
        result,
        Err(TranslateError::Invalid(ValidationError::IncompleteEndpoint))
    );

    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn translate_routes_through_the_proxy_and_decodes_the_body() {
    let body = r#"[[["你好","hello"]],null,"en"]"#.as_bytes();
    let (selector, client) = selector(ScriptedProbeClient::with_default(Ok(
        response_with_body(200, body),
    )));

    let translation = selector
        .translate_with_proxy("hello", "zh", &local_proxy(), None)
        .await
        .unwrap();

    assert_eq!(translation.text, "你好");
    assert_eq!(translation.detected_source_lang, "en");

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    let (url, proxy) = &calls[0];
    assert!(url.starts_with(TRANSLATION_ENDPOINT));
    assert!(url.contains("sl=auto"));
    assert!(url.contains("tl=zh"));
    assert!(url.contains("q=hello"));
    assert_eq!(proxy.as_deref(), Some("http://127.0.0.1:7890"));
}

#[tokio::test]
async fn translate_passes_an_explicit_source_language() {
    let body = br#"[[["bonjour","hello"]]]"#;
    let (selector, client) = selector(ScriptedProbeClient::with_default(Ok(
        response_with_body(200, body),
    )));

    let translation = selector
        .translate_with_proxy("hello", "fr", &local_proxy(), Some("en"))
        .await
        .unwrap();

    // no detected language in the body: the requested source is echoed back
    assert_eq!(translation.detected_source_lang, "en");
    assert!(client.calls()[0].0.contains("sl=en"));
}

#[tokio::test]
async fn translate_maps_407_to_proxy_auth_failure() {
    let (selector, _) = selector(ScriptedProbeClient::ok(407));

    let result = selector
        .translate_with_proxy("hello", "fr", &local_proxy(), None)
        .await;

    assert_eq!(
        result,
        Err(TranslateError::Connectivity(ProbeFailure::ProxyAuthRequired))
    );
}

#[tokio::test]
async fn translate_reports_unexpected_statuses() {
    let (selector, _) = selector(ScriptedProbeClient::ok(500));

    let result = selector
        .translate_with_proxy("hello", "fr", &local_proxy(), None)
        .await;

    assert_eq!(result, Err(TranslateError::UnexpectedStatus(500)));
}

#[tokio::test]
async fn translate_propagates_transport_failures() {
    let (selector, _) = selector(ScriptedProbeClient::err(ProbeFailure::DnsFailure));

    let result = selector
        .translate_with_proxy("hello", "fr", &local_proxy(), None)
        .await;

    assert_eq!(
        result,
        Err(TranslateError::Connectivity(ProbeFailure::DnsFailure))
    );
}

#[tokio::test]
async fn translate_rejects_malformed_bodies() {
    let (selector, _) = selector(ScriptedProbeClient::with_default(Ok(
        response_with_body(200, b"not json"),
    )));

    let result = selector
        .translate_with_proxy("hello", "fr", &local_proxy(), None)
        .await;

    assert_eq!(result, Err(TranslateError::MalformedResponse));
}
