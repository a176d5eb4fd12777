//! Pipeline error taxonomy.
//!
//! `PipelineError` is what individual components return. The orchestrator
//! wraps it in a `StageError` so callers can tell which stage aborted a run.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::model::ModelError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Input text must be a non-empty string")]
    EmptyInput,

    #[error("{which} marker '{marker}' not found")]
    MarkerNotFound { which: MarkerKind, marker: String },

    #[error("Model call failed with a non-retryable error: {0}")]
    ModelFatal(#[source] ModelError),

    #[error("Model call failed after {attempts} attempts: {last}")]
    ModelExhausted {
        attempts: u32,
        #[source]
        last: ModelError,
    },

    #[error("Model returned an invalid clustering response: {0}")]
    InvalidClusterResponse(String),

    #[error("Model returned an invalid action analysis: {0}")]
    InvalidActionAnalysis(String),

    #[error("Failed to load prompt template '{name}': {reason}")]
    TemplateLoad { name: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which delimiter the segmenter was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Start,
    End,
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::End => write!(f, "End"),
        }
    }
}

/// Pipeline stage in which a run aborted. Filtering and extraction contain
/// their failures per segment, so they never abort a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Input,
    Segmentation,
    Clustering,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Segmentation => "segmentation",
            Self::Clustering => "clustering",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A pipeline run that aborted, tagged with the stage that failed.
#[derive(Error, Debug)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    pub stage: PipelineStage,
    #[source]
    pub source: PipelineError,
}

impl StageError {
    pub fn new(stage: PipelineStage, source: PipelineError) -> Self {
        Self { stage, source }
    }
}
