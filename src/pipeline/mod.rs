pub mod error;
pub mod types;
pub mod model;
pub mod gateway; // Retry + full-jitter backoff around a TextModel
pub mod segmenter;
pub mod parser; // Layered JSON-object extraction from free text
pub mod prompt;
pub mod clustering;
pub mod filtering;
pub mod extraction; // Assignees → deadlines → priority → category
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{MarkerKind, PipelineError, PipelineStage, StageError};
pub use orchestrator::{resolve_transcript_input, ActionPipeline};
pub use types::*;
