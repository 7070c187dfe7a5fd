//! Translation Response Parsing
//!
//! The translation endpoint answers with a nested-array shape: element 0 is
//! an array of `[translatedFragment, originalFragment, ...]` pairs and the
//! detected source language sits at a fixed index further along. Parsing is
//! pure so it can be exercised without any I/O.

use serde_json::Value;

use crate::core::translation::client::{Translation, TranslateError};

/// Index of the detected source language in the response array.
const DETECTED_LANG_INDEX: usize = 2;

/// Fixed entity set the decoder unescapes, applied in table order.
const ENTITY_TABLE: [(&str, &str); 9] = [
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#x27;", "'"),
    ("&#39;", "'"),
    ("&#x2F;", "/"),
    ("&#47;", "/"),
    ("&apos;", "'"),
];

/// Upper bound on unescape passes: tolerates double-encoding without
/// risking unbounded loops on adversarial input.
const MAX_UNESCAPE_PASSES: usize = 3;

/// Parse a translation response body.
///
/// All `translatedFragment` values (index 0 of each pair in element 0) are
/// concatenated in order; the detected source language is read from the
/// fixed response index and falls back to `requested_source` when absent.
/// The concatenated text is passed through the bounded HTML-entity decoder.
pub fn parse_translation_response(
    body: &[u8],
    requested_source: &str,
) -> Result<Translation, TranslateError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| TranslateError::MalformedResponse)?;

    let fragments = value
        .get(0)
        .and_then(Value::as_array)
        .ok_or(TranslateError::MalformedResponse)?;

    let mut text = String::new();
    for pair in fragments {
        if let Some(fragment) = pair.get(0).and_then(Value::as_str) {
            text.push_str(fragment);
        }
    }

    let detected_source_lang = value
        .get(DETECTED_LANG_INDEX)
        .and_then(Value::as_str)
        .unwrap_or(requested_source)
        .to_string();

    Ok(Translation {
        text: decode_html_entities(&text),
        detected_source_lang,
    })
}

/// Repeatedly unescape the fixed entity set, up to three passes.
///
/// Stops early once a pass changes nothing.
pub fn decode_html_entities(input: &str) -> String {
    let mut current = input.to_string();
    for _ in 0..MAX_UNESCAPE_PASSES {
        let mut next = current.clone();
        for (entity, replacement) in ENTITY_TABLE {
            if next.contains(entity) {
                next = next.replace(entity, replacement);
            }
        }
        if next == current {
            break;
        }
        current = next;
    }
    current
}
