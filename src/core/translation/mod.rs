//! Conditional Translation Proxying
//!
//! Decides, from a three-valued mode and a cached block-detection result,
//! whether the translation subsystem should route its calls through a
//! proxy, and performs that proxied call including response decoding.

pub mod client;
pub mod parsing;
pub mod selector;

// Re-export public API
pub use self::client::{build_translate_url, translate_with_proxy, Translation, TranslateError};
pub use self::parsing::{decode_html_entities, parse_translation_response};
pub use self::selector::{
    ProxyMode, TranslationProxyContext, TranslationProxySelector, BLOCKED_CACHE_TTL,
    TRANSLATION_ENDPOINT,
};
