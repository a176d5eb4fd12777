//! Prompt templates for every model-driven stage.
//!
//! Templates use named placeholders (`{input_data}`, `{segment_data}`,
//! `{extracted_data}`); literal braces are written `{{` and `}}`. A template
//! is parsed once at load time, so a stray brace or an unknown placeholder is
//! a load error rather than a broken prompt at call time.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use super::PipelineError;
use crate::config::PipelineSettings;

pub const INPUT_DATA: &str = "input_data";
pub const SEGMENT_DATA: &str = "segment_data";
pub const EXTRACTED_DATA: &str = "extracted_data";

// ═══════════════════════════════════════════════════════════
// Prompt kinds
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Clustering,
    Filtering,
    Assignees,
    Deadlines,
    Priority,
    Category,
}

impl PromptKind {
    pub fn all() -> &'static [PromptKind] {
        &[
            Self::Clustering,
            Self::Filtering,
            Self::Assignees,
            Self::Deadlines,
            Self::Priority,
            Self::Category,
        ]
    }

    fn index(self) -> usize {
        self as usize
    }

    /// File name looked up by `PromptSet::load_dir`.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Clustering => "clustering_service_prompt.txt",
            Self::Filtering => "filtering_service_prompt.txt",
            Self::Assignees => "extraction_assignees_prompt.txt",
            Self::Deadlines => "extraction_deadlines_prompt.txt",
            Self::Priority => "extraction_priority_prompt.txt",
            Self::Category => "extraction_category_prompt.txt",
        }
    }

    /// Placeholders the template may reference.
    pub fn placeholders(&self) -> &'static [&'static str] {
        match self {
            Self::Clustering | Self::Filtering => &[INPUT_DATA],
            // First link of the extraction chain sees only the segment.
            Self::Assignees => &[SEGMENT_DATA],
            Self::Deadlines | Self::Priority | Self::Category => &[SEGMENT_DATA, EXTRACTED_DATA],
        }
    }

    fn builtin_text(&self) -> &'static str {
        match self {
            Self::Clustering => include_str!("../../prompts/clustering_service_prompt.txt"),
            Self::Filtering => include_str!("../../prompts/filtering_service_prompt.txt"),
            Self::Assignees => include_str!("../../prompts/extraction_assignees_prompt.txt"),
            Self::Deadlines => include_str!("../../prompts/extraction_deadlines_prompt.txt"),
            Self::Priority => include_str!("../../prompts/extraction_priority_prompt.txt"),
            Self::Category => include_str!("../../prompts/extraction_category_prompt.txt"),
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Clustering => "clustering",
            Self::Filtering => "filtering",
            Self::Assignees => "assignees",
            Self::Deadlines => "deadlines",
            Self::Priority => "priority",
            Self::Category => "category",
        };
        write!(f, "{name}")
    }
}

// ═══════════════════════════════════════════════════════════
// Template
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Literal(String),
    Slot(&'static str),
}

/// A parsed prompt template.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    name: String,
    pieces: Vec<Piece>,
}

impl PromptTemplate {
    /// Parse `text`, accepting only the placeholders in `allowed`.
    pub fn parse(name: &str, text: &str, allowed: &[&'static str]) -> Result<Self, PipelineError> {
        let fail = |reason: String| PipelineError::TemplateLoad {
            name: name.to_string(),
            reason,
        };

        if text.trim().is_empty() {
            return Err(fail("template is empty".into()));
        }

        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = text.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if chars.peek().map(|&(_, n)| n) == Some('{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek().map(|&(_, n)| n) == Some('}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let rest = &text[pos + 1..];
                    let close = rest
                        .find('}')
                        .ok_or_else(|| fail(format!("unclosed '{{' at byte {pos}")))?;
                    let key = &rest[..close];
                    let slot = allowed
                        .iter()
                        .copied()
                        .find(|a| *a == key)
                        .ok_or_else(|| fail(format!("unknown placeholder '{{{key}}}'")))?;
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(Piece::Slot(slot));
                    // Skip the key and its closing brace.
                    for _ in 0..key.chars().count() + 1 {
                        chars.next();
                    }
                }
                '}' => return Err(fail(format!("unmatched '}}' at byte {pos}"))),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Ok(Self {
            name: name.to_string(),
            pieces,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the template references `placeholder`.
    pub fn uses(&self, placeholder: &str) -> bool {
        self.pieces
            .iter()
            .any(|p| matches!(p, Piece::Slot(s) if *s == placeholder))
    }

    /// Substitute placeholders. Slots without a value render empty.
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Slot(key) => {
                    if let Some((_, value)) = values.iter().find(|(k, _)| k == key) {
                        out.push_str(value);
                    }
                }
            }
        }
        out
    }
}

/// Pretty-printed JSON for prompt payloads.
pub fn json_payload<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

// ═══════════════════════════════════════════════════════════
// Prompt set
// ═══════════════════════════════════════════════════════════

/// One parsed template per `PromptKind`.
#[derive(Debug, Clone)]
pub struct PromptSet {
    templates: Vec<PromptTemplate>,
}

impl PromptSet {
    /// Templates compiled into the binary.
    pub fn builtin() -> Result<Self, PipelineError> {
        Self::collect(|kind| Ok(kind.builtin_text().to_string()))
    }

    /// Read every template from `dir`. A missing, unreadable or empty file
    /// fails the whole load.
    pub fn load_dir(dir: &Path) -> Result<Self, PipelineError> {
        Self::collect(|kind| {
            let path = dir.join(kind.file_name());
            std::fs::read_to_string(&path).map_err(|e| PipelineError::TemplateLoad {
                name: kind.file_name().to_string(),
                reason: format!("{}: {e}", path.display()),
            })
        })
    }

    /// `load_dir` when `settings.prompt_dir` is set, otherwise `builtin`.
    pub fn from_settings(settings: &PipelineSettings) -> Result<Self, PipelineError> {
        match &settings.prompt_dir {
            Some(dir) => Self::load_dir(dir),
            None => Self::builtin(),
        }
    }

    /// Replace a single template.
    pub fn with_template(mut self, kind: PromptKind, text: &str) -> Result<Self, PipelineError> {
        self.templates[kind.index()] = PromptTemplate::parse(kind.file_name(), text, kind.placeholders())?;
        Ok(self)
    }

    pub fn get(&self, kind: PromptKind) -> &PromptTemplate {
        &self.templates[kind.index()]
    }

    fn collect<F>(mut source: F) -> Result<Self, PipelineError>
    where
        F: FnMut(PromptKind) -> Result<String, PipelineError>,
    {
        let templates = PromptKind::all()
            .iter()
            .map(|&kind| {
                let text = source(kind)?;
                PromptTemplate::parse(kind.file_name(), &text, kind.placeholders())
            })
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(templates = templates.len(), "Prompt templates loaded");
        Ok(Self { templates })
    }
}
