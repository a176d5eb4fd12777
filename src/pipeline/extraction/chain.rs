//! Per-segment extraction chain.
//!
//! Assignees, deadlines, priority and category are asked for in that order.
//! Each prompt carries the analyzed segment (its chunks and the filter's
//! verdict) plus everything extracted so far. A stage
//! that fails for any reason contributes its defaults instead, so the chain
//! always completes.

use serde::Serialize;
use serde_json::Value;

use super::stages::{spec, ExtractionStage, StageSpec, CHAIN};
use crate::pipeline::gateway::ModelGateway;
use crate::pipeline::parser::{extract_object, JsonObject};
use crate::pipeline::prompt::{json_payload, PromptSet, PromptTemplate, EXTRACTED_DATA, SEGMENT_DATA};
use crate::pipeline::types::{
    AnalyzedSegment, Category, ExtractionResult, Priority, Segment, NO_DEADLINE,
    NO_TASK_DESCRIPTION, UNASSIGNED,
};
use crate::pipeline::PipelineError;

/// Raw per-stage objects before flattening.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageOutputs {
    pub assignees: JsonObject,
    pub deadlines: JsonObject,
    pub priority: JsonObject,
    pub category: JsonObject,
}

impl Default for StageOutputs {
    /// Every stage at its defaults.
    fn default() -> Self {
        Self {
            assignees: spec(ExtractionStage::Assignees).defaults(),
            deadlines: spec(ExtractionStage::Deadlines).defaults(),
            priority: spec(ExtractionStage::Priority).defaults(),
            category: spec(ExtractionStage::Category).defaults(),
        }
    }
}

impl StageOutputs {
    /// Collapse to one action item: first assignee, first deadline, the
    /// priority and category labels, and the segment summary as the task.
    pub fn flatten(&self, segment: &Segment) -> ExtractionResult {
        let task = if segment.topic_summary.trim().is_empty() {
            NO_TASK_DESCRIPTION.to_string()
        } else {
            segment.topic_summary.clone()
        };

        ExtractionResult {
            task,
            assignee: first_value(self.assignees.get("assignees")).unwrap_or_else(|| UNASSIGNED.into()),
            deadline: first_value(self.deadlines.get("deadlines")).unwrap_or_else(|| NO_DEADLINE.into()),
            priority_level: self
                .priority
                .get("priority")
                .and_then(Value::as_str)
                .and_then(Priority::from_label)
                .unwrap_or_default(),
            category: self
                .category
                .get("category")
                .and_then(Value::as_str)
                .and_then(Category::from_label)
                .unwrap_or_default(),
        }
    }
}

/// First element of a list (strings as-is, anything else as JSON text), or a
/// bare non-empty string.
fn first_value(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::Array(items) => match items.first()? {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
        Value::String(s) => s.clone(),
        _ => return None,
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

pub struct ExtractionChain {
    /// Aligned with `CHAIN`.
    templates: Vec<PromptTemplate>,
}

impl ExtractionChain {
    pub fn new(prompts: &PromptSet) -> Self {
        Self {
            templates: CHAIN.iter().map(|s| prompts.get(s.prompt).clone()).collect(),
        }
    }

    /// Run all four stages for `segment`, returning the raw stage objects.
    pub fn run_stages(&self, analyzed: &AnalyzedSegment, gateway: &ModelGateway) -> StageOutputs {
        let segment = &analyzed.segment;
        let segment_data = json_payload(analyzed);

        let assignees = self.run_stage(0, segment, &segment_data, None, gateway);
        let deadlines = self.run_stage(1, segment, &segment_data, Some(&assignees), gateway);

        let mut context = assignees.clone();
        context.extend(deadlines.clone());
        let priority = self.run_stage(2, segment, &segment_data, Some(&context), gateway);

        context.extend(priority.clone());
        let category = self.run_stage(3, segment, &segment_data, Some(&context), gateway);

        StageOutputs {
            assignees,
            deadlines,
            priority,
            category,
        }
    }

    /// Extract one flattened action item from an actionable segment.
    pub fn extract_from_segment(&self, analyzed: &AnalyzedSegment, gateway: &ModelGateway) -> ExtractionResult {
        let span = tracing::info_span!("extract_segment", segment_id = analyzed.segment.segment_id);
        let _guard = span.enter();

        let result = self.run_stages(analyzed, gateway).flatten(&analyzed.segment);
        tracing::debug!(
            assignee = %result.assignee,
            deadline = %result.deadline,
            priority = %result.priority_level,
            category = %result.category,
            "Segment extracted"
        );
        result
    }

    /// `extract_from_segment` over each segment, in order.
    pub fn extract_from_segments<'a, I>(&self, segments: I, gateway: &ModelGateway) -> Vec<ExtractionResult>
    where
        I: IntoIterator<Item = &'a AnalyzedSegment>,
    {
        segments
            .into_iter()
            .map(|segment| self.extract_from_segment(segment, gateway))
            .collect()
    }

    fn run_stage(
        &self,
        index: usize,
        segment: &Segment,
        segment_data: &str,
        context: Option<&JsonObject>,
        gateway: &ModelGateway,
    ) -> JsonObject {
        let spec = &CHAIN[index];
        match self.try_stage(&self.templates[index], spec, segment_data, context, gateway) {
            Ok(Some(output)) => output,
            Ok(None) => {
                tracing::warn!(
                    segment_id = segment.segment_id,
                    stage = %spec.stage,
                    "Unusable extraction response, using defaults"
                );
                spec.defaults()
            }
            Err(e) => {
                tracing::warn!(
                    segment_id = segment.segment_id,
                    stage = %spec.stage,
                    error = %e,
                    "Extraction stage failed, using defaults"
                );
                spec.defaults()
            }
        }
    }

    /// `Ok(None)` when the response has no usable object.
    fn try_stage(
        &self,
        template: &PromptTemplate,
        spec: &StageSpec,
        segment_data: &str,
        context: Option<&JsonObject>,
        gateway: &ModelGateway,
    ) -> Result<Option<JsonObject>, PipelineError> {
        let extracted_data = context.map(|c| json_payload(c));
        let mut values = vec![(SEGMENT_DATA, segment_data)];
        if let Some(extracted) = extracted_data.as_deref() {
            values.push((EXTRACTED_DATA, extracted));
        }

        let response = gateway.complete(&template.render(&values))?;
        Ok(extract_object(&response).and_then(|parsed| spec.normalize(parsed)))
    }
}
