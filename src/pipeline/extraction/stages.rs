//! The extraction stage table.
//!
//! Every stage runs the same algorithm (render, call, parse, normalize, fall
//! back to defaults); what differs per stage lives in its `StageSpec`.

use std::fmt;

use serde_json::{json, Value};

use crate::pipeline::parser::JsonObject;
use crate::pipeline::prompt::PromptKind;
use crate::pipeline::types::{Category, Priority};

/// Neutral confidence used when the model's value is missing or not an integer.
pub const DEFAULT_CONFIDENCE: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionStage {
    Assignees,
    Deadlines,
    Priority,
    Category,
}

impl ExtractionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assignees => "assignees",
            Self::Deadlines => "deadlines",
            Self::Priority => "priority",
            Self::Category => "category",
        }
    }
}

impl fmt::Display for ExtractionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-stage configuration.
pub struct StageSpec {
    pub stage: ExtractionStage,
    pub prompt: PromptKind,
    /// Repair a parsed response in place, or reject it (`None`) so the
    /// stage defaults are used instead.
    normalize: fn(JsonObject) -> Option<JsonObject>,
    defaults: fn() -> JsonObject,
}

impl StageSpec {
    pub fn normalize(&self, parsed: JsonObject) -> Option<JsonObject> {
        (self.normalize)(parsed)
    }

    pub fn defaults(&self) -> JsonObject {
        (self.defaults)()
    }
}

/// Stages in chain order. Each stage sees the merged output of the ones
/// before it.
pub static CHAIN: [StageSpec; 4] = [
    StageSpec {
        stage: ExtractionStage::Assignees,
        prompt: PromptKind::Assignees,
        normalize: normalize_assignees,
        defaults: assignee_defaults,
    },
    StageSpec {
        stage: ExtractionStage::Deadlines,
        prompt: PromptKind::Deadlines,
        normalize: normalize_deadlines,
        defaults: deadline_defaults,
    },
    StageSpec {
        stage: ExtractionStage::Priority,
        prompt: PromptKind::Priority,
        normalize: normalize_priority,
        defaults: priority_defaults,
    },
    StageSpec {
        stage: ExtractionStage::Category,
        prompt: PromptKind::Category,
        normalize: normalize_category,
        defaults: category_defaults,
    },
];

pub fn spec(stage: ExtractionStage) -> &'static StageSpec {
    match stage {
        ExtractionStage::Assignees => &CHAIN[0],
        ExtractionStage::Deadlines => &CHAIN[1],
        ExtractionStage::Priority => &CHAIN[2],
        ExtractionStage::Category => &CHAIN[3],
    }
}

// ═══════════════════════════════════════════════════════════
// Defaults
// ═══════════════════════════════════════════════════════════

fn object(value: Value) -> JsonObject {
    match value {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

fn assignee_defaults() -> JsonObject {
    object(json!({"assignees": []}))
}

fn deadline_defaults() -> JsonObject {
    object(json!({"deadlines": [], "urgent_flags": []}))
}

fn priority_defaults() -> JsonObject {
    object(json!({
        "priority": Priority::default().as_str(),
        "confidence": DEFAULT_CONFIDENCE,
        "reasoning": "Default due to extraction failure"
    }))
}

fn category_defaults() -> JsonObject {
    object(json!({
        "category": Category::default().as_str(),
        "confidence": DEFAULT_CONFIDENCE,
        "reasoning": "Default due to extraction failure"
    }))
}

// ═══════════════════════════════════════════════════════════
// Normalizers
// ═══════════════════════════════════════════════════════════

/// Without an `assignees` key the response is unusable.
fn normalize_assignees(parsed: JsonObject) -> Option<JsonObject> {
    parsed.contains_key("assignees").then_some(parsed)
}

fn normalize_deadlines(mut parsed: JsonObject) -> Option<JsonObject> {
    for key in ["deadlines", "urgent_flags"] {
        parsed.entry(key).or_insert_with(|| Value::Array(Vec::new()));
    }
    Some(parsed)
}

fn normalize_priority(parsed: JsonObject) -> Option<JsonObject> {
    let labels: Vec<&str> = Priority::all().iter().map(Priority::as_str).collect();
    Some(normalize_assessment(
        parsed,
        "priority",
        &labels,
        Priority::default().as_str(),
        "Priority assessment completed",
    ))
}

fn normalize_category(parsed: JsonObject) -> Option<JsonObject> {
    let labels: Vec<&str> = Category::all().iter().map(Category::as_str).collect();
    Some(normalize_assessment(
        parsed,
        "category",
        &labels,
        Category::default().as_str(),
        "Category assessment completed",
    ))
}

/// Shared repair for label + confidence + reasoning responses: an unknown
/// label becomes `fallback`, a non-integer confidence becomes 50, and a
/// missing reasoning is filled in.
fn normalize_assessment(
    mut parsed: JsonObject,
    key: &str,
    labels: &[&str],
    fallback: &str,
    reasoning: &str,
) -> JsonObject {
    let label_ok = parsed
        .get(key)
        .and_then(Value::as_str)
        .is_some_and(|label| labels.contains(&label));
    if !label_ok {
        parsed.insert(key.to_string(), Value::from(fallback));
    }

    let confidence_ok = parsed
        .get("confidence")
        .is_some_and(|c| c.is_i64() || c.is_u64());
    if !confidence_ok {
        parsed.insert("confidence".to_string(), Value::from(DEFAULT_CONFIDENCE));
    }

    parsed
        .entry("reasoning")
        .or_insert_with(|| Value::from(reasoning));
    parsed
}
