//! Topic clustering: ask the model to group chunks into segments.
//!
//! Clustering has no safe fallback, so any failure here aborts the run.

use std::collections::HashMap;

use serde_json::Value;

use super::gateway::ModelGateway;
use super::parser::{extract_object, JsonObject};
use super::prompt::{json_payload, PromptTemplate, INPUT_DATA};
use super::types::{Chunk, Segment};
use super::PipelineError;

pub struct Clusterer {
    template: PromptTemplate,
}

impl Clusterer {
    pub fn new(template: PromptTemplate) -> Self {
        Self { template }
    }

    /// Group `chunks` into topic segments.
    ///
    /// Chunk ids the model references but that do not exist are dropped from
    /// their segment; the segment itself is kept.
    pub fn chunks_to_segments(
        &self,
        chunks: &[Chunk],
        gateway: &ModelGateway,
    ) -> Result<Vec<Segment>, PipelineError> {
        let prompt = self.template.render(&[(INPUT_DATA, &json_payload(chunks))]);
        let response = gateway.complete(&prompt)?;

        let parsed = extract_object(&response).ok_or_else(|| {
            PipelineError::InvalidClusterResponse("Model returned invalid JSON format".into())
        })?;

        let segments = enrich_segments(&parsed, chunks)?;
        tracing::info!(
            chunks = chunks.len(),
            segments = segments.len(),
            "Chunks clustered into segments"
        );
        Ok(segments)
    }
}

/// Resolve the model's `segments` list against the original chunks by id.
fn enrich_segments(parsed: &JsonObject, chunks: &[Chunk]) -> Result<Vec<Segment>, PipelineError> {
    let by_id: HashMap<usize, &Chunk> = chunks.iter().map(|c| (c.id, c)).collect();

    let entries = match parsed.get("segments") {
        None => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(invalid("'segments' is not a list")),
    };

    entries
        .iter()
        .map(|entry| {
            let entry = entry
                .as_object()
                .ok_or_else(|| invalid("segment entry is not an object"))?;

            let segment_id = entry
                .get("segment_id")
                .and_then(as_segment_id)
                .ok_or_else(|| invalid("segment entry has no usable 'segment_id'"))?;

            let topic_summary = entry
                .get("topic_summary")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid("segment entry has no 'topic_summary'"))?
                .to_string();

            let referenced = match entry.get("chunk_ids") {
                None => &[][..],
                Some(Value::Array(ids)) => ids.as_slice(),
                Some(_) => return Err(invalid("'chunk_ids' is not a list")),
            };

            let resolved: Vec<Chunk> = referenced
                .iter()
                .filter_map(Value::as_u64)
                .filter_map(|id| by_id.get(&(id as usize)).map(|c| (*c).clone()))
                .collect();

            if resolved.len() < referenced.len() {
                tracing::debug!(
                    segment_id,
                    referenced = referenced.len(),
                    resolved = resolved.len(),
                    "Dropped unresolved chunk ids"
                );
            }

            Ok(Segment {
                segment_id,
                topic_summary,
                chunks: resolved,
            })
        })
        .collect()
}

/// Integer ids, or strings holding one.
fn as_segment_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn invalid(reason: &str) -> PipelineError {
    PipelineError::InvalidClusterResponse(reason.to_string())
}
