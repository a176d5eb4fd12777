//! Layered JSON-object extraction from free-form model output.
//!
//! Models wrap their payload in prose, code fences, or both, and the drift
//! gets worse deeper into a prompt chain. Strategies, first success wins:
//!
//! 1. Interior of a fenced block (```` ``` ```` or ```` ```json ````, any case).
//! 2. First brace-delimited substring (at most one nesting level) that parses.
//! 3. The span from the first `{` to the last `}`.
//!
//! Only keyed mappings are accepted; arrays and scalars count as failure.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

pub type JsonObject = Map<String, Value>;

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```(?:json)?\s*([\s\S]*?)\s*```").unwrap());

static BRACED_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}").unwrap());

/// Extract a single JSON object from `text`. Never fails; returns `None`
/// when no strategy yields an object.
pub fn extract_object(text: &str) -> Option<JsonObject> {
    from_fenced_block(text)
        .or_else(|| from_braced_substrings(text))
        .or_else(|| from_outer_braces(text))
}

fn from_fenced_block(text: &str) -> Option<JsonObject> {
    let inner = FENCED_BLOCK.captures(text)?.get(1)?;
    parse_object(inner.as_str())
}

fn from_braced_substrings(text: &str) -> Option<JsonObject> {
    BRACED_OBJECT
        .find_iter(text)
        .find_map(|m| parse_object(m.as_str()))
}

fn from_outer_braces(text: &str) -> Option<JsonObject> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start >= end {
        return None;
    }
    parse_object(&text[start..=end])
}

fn parse_object(candidate: &str) -> Option<JsonObject> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
