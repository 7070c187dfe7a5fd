//! Proxied Translation Call
//!
//! One GET request through a given proxy to the translation endpoint, with
//! response decoding delegated to `parsing`. Input validation happens
//! before any I/O; transport failures are mapped to the same categorical
//! explanations used by chain diagnosis.

use crate::core::proxy::endpoint::build_url;
use crate::core::proxy::probe::{ProbeClient, ProbeFailure};
use crate::core::proxy::types::{ProxyEndpoint, ValidationError};
use crate::core::translation::parsing::parse_translation_response;
use crate::core::translation::selector::TRANSLATION_ENDPOINT;

/// Decoded translation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    /// Detected source language, or the requested one when not reported
    pub detected_source_lang: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Connectivity(ProbeFailure),
    #[error("translation service returned HTTP {0}")]
    UnexpectedStatus(u16),
    #[error("translation response could not be decoded")]
    MalformedResponse,
}

/// Build the translation request URL with percent-encoded query values
pub fn build_translate_url(text: &str, target_lang: &str, source_lang: &str) -> String {
    format!(
        "{}/translate_a/single?client=gtx&sl={}&tl={}&dt=t&q={}",
        TRANSLATION_ENDPOINT,
        urlencoding::encode(source_lang),
        urlencoding::encode(target_lang),
        urlencoding::encode(text)
    )
}

/// Translate `text` into `target_lang` through `proxy`.
///
/// Rejects empty text/target and structurally incomplete proxies before any
/// I/O. `source_lang` defaults to `"auto"` when empty. HTTP 407 from the
/// proxy is reported as the categorical proxy-authentication failure.
pub async fn translate_with_proxy(
    client: &dyn ProbeClient,
    text: &str,
    target_lang: &str,
    proxy: &ProxyEndpoint,
    source_lang: &str,
    timeout_ms: u64,
) -> Result<Translation, TranslateError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyText.into());
    }
    if target_lang.trim().is_empty() {
        return Err(ValidationError::EmptyTargetLang.into());
    }
    if !proxy.is_complete() {
        return Err(ValidationError::IncompleteEndpoint.into());
    }

    let source_lang = if source_lang.trim().is_empty() {
        "auto"
    } else {
        source_lang
    };

    let url = build_translate_url(text, target_lang, source_lang);
    let proxy_url = build_url(proxy);

    let response = client
        .request(&url, Some(&proxy_url), timeout_ms)
        .await
        .map_err(TranslateError::Connectivity)?;

    if response.status == 407 {
        return Err(TranslateError::Connectivity(ProbeFailure::ProxyAuthRequired));
    }
    if !(200..300).contains(&response.status) {
        return Err(TranslateError::UnexpectedStatus(response.status));
    }

    parse_translation_response(&response.body, source_lang)
}
