//! Actionability filter: classify each segment as containing an action item
//! or not.
//!
//! Failures are contained per segment. A segment whose analysis fails is
//! recorded as a zero-confidence "no" and the batch carries on.

use serde_json::Value;

use super::gateway::ModelGateway;
use super::parser::{extract_object, JsonObject};
use super::prompt::{json_payload, PromptTemplate, INPUT_DATA};
use super::types::{ActionAnalysis, ActionFound, AnalyzedSegment, Segment};
use super::PipelineError;

const REQUIRED_KEYS: [&str; 3] = ["action_segments_found", "confidence_percentage", "explanation"];

pub struct ActionFilter {
    template: PromptTemplate,
}

impl ActionFilter {
    pub fn new(template: PromptTemplate) -> Self {
        Self { template }
    }

    /// Analyze one segment. Any gateway, parse or validation failure is
    /// returned to the caller.
    pub fn analyze_segment(
        &self,
        segment: &Segment,
        gateway: &ModelGateway,
    ) -> Result<AnalyzedSegment, PipelineError> {
        let prompt = self.template.render(&[(INPUT_DATA, &json_payload(segment))]);
        let response = gateway.complete(&prompt)?;

        let parsed = extract_object(&response).ok_or_else(|| {
            PipelineError::InvalidActionAnalysis("Model returned invalid JSON format".into())
        })?;
        let action_analysis = validate_analysis(&parsed)?;

        Ok(AnalyzedSegment {
            segment: segment.clone(),
            action_analysis,
        })
    }

    /// Analyze every segment, substituting the degraded verdict for any
    /// segment whose analysis fails. Output order and length match `segments`.
    pub fn analyze_segments(&self, segments: &[Segment], gateway: &ModelGateway) -> Vec<AnalyzedSegment> {
        segments
            .iter()
            .map(|segment| {
                self.analyze_segment(segment, gateway).unwrap_or_else(|e| {
                    tracing::warn!(
                        segment_id = segment.segment_id,
                        error = %e,
                        "Segment analysis failed, marking as not actionable"
                    );
                    AnalyzedSegment {
                        segment: segment.clone(),
                        action_analysis: ActionAnalysis::degraded(),
                    }
                })
            })
            .collect()
    }

    /// Segments the model judged actionable.
    pub fn filter_for_actionable_segments(
        &self,
        segments: &[Segment],
        gateway: &ModelGateway,
    ) -> Vec<AnalyzedSegment> {
        let actionable: Vec<_> = self
            .analyze_segments(segments, gateway)
            .into_iter()
            .filter(AnalyzedSegment::is_actionable)
            .collect();
        tracing::info!(
            segments = segments.len(),
            actionable = actionable.len(),
            "Segments filtered for actions"
        );
        actionable
    }
}

/// Exactly the three keys; "yes"/"no"; integer confidence in 0..=100; string
/// explanation.
fn validate_analysis(parsed: &JsonObject) -> Result<ActionAnalysis, PipelineError> {
    let invalid = |reason: &str| PipelineError::InvalidActionAnalysis(reason.to_string());

    if parsed.len() != REQUIRED_KEYS.len() || !REQUIRED_KEYS.iter().all(|k| parsed.contains_key(*k)) {
        return Err(invalid("expected exactly action_segments_found, confidence_percentage and explanation"));
    }

    let action_segments_found = match parsed.get("action_segments_found").and_then(Value::as_str) {
        Some("yes") => ActionFound::Yes,
        Some("no") => ActionFound::No,
        _ => return Err(invalid("action_segments_found must be \"yes\" or \"no\"")),
    };

    let confidence_percentage = parsed
        .get("confidence_percentage")
        .and_then(Value::as_u64)
        .filter(|c| *c <= 100)
        .and_then(|c| u8::try_from(c).ok())
        .ok_or_else(|| invalid("confidence_percentage must be an integer between 0 and 100"))?;

    let explanation = parsed
        .get("explanation")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("explanation must be a string"))?
        .to_string();

    Ok(ActionAnalysis {
        action_segments_found,
        confidence_percentage,
        explanation,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::pipeline::model::{MockTextModel, ModelError};
    use crate::pipeline::prompt::{PromptKind, PromptSet};
    use crate::pipeline::testing::gateway;
    use crate::pipeline::types::Chunk;

    fn segment(id: i64) -> Segment {
        Segment {
            segment_id: id,
            topic_summary: format!("Topic {id}"),
            chunks: vec![Chunk {
                id: id as usize,
                order: id as usize,
                content: format!("Speaker: line {id}"),
            }],
        }
    }

    fn filter() -> ActionFilter {
        ActionFilter::new(PromptSet::builtin().unwrap().get(PromptKind::Filtering).clone())
    }

    fn validate(value: serde_json::Value) -> Result<ActionAnalysis, PipelineError> {
        match value {
            serde_json::Value::Object(map) => validate_analysis(&map),
            _ => unreachable!(),
        }
    }

    const YES: &str = r#"```json
{"action_segments_found": "yes", "confidence_percentage": 90, "explanation": "Bob commits."}
```"#;

    #[test]
    fn valid_analysis_accepted() {
        let model = Arc::new(MockTextModel::new(YES));
        let analyzed = filter().analyze_segment(&segment(1), &gateway(model)).unwrap();
        assert!(analyzed.is_actionable());
        assert_eq!(analyzed.action_analysis.confidence_percentage, 90);
        assert_eq!(analyzed.segment, segment(1));
    }

    #[test]
    fn validation_rejects_bad_shapes() {
        let base = json!({"action_segments_found": "no", "confidence_percentage": 10, "explanation": "x"});
        assert!(validate(base.clone()).is_ok());

        let mut extra = base.clone();
        extra["notes"] = json!("extra");
        assert!(validate(extra).is_err());

        let mut missing = base.clone();
        missing.as_object_mut().unwrap().remove("explanation");
        assert!(validate(missing).is_err());

        let mut maybe = base.clone();
        maybe["action_segments_found"] = json!("Yes");
        assert!(validate(maybe).is_err());

        for bad in [json!(101), json!(-1), json!(85.5), json!("85"), json!(null)] {
            let mut v = base.clone();
            v["confidence_percentage"] = bad;
            assert!(validate(v).is_err());
        }

        let mut explanation = base.clone();
        explanation["explanation"] = json!(42);
        assert!(validate(explanation).is_err());
    }

    #[test]
    fn confidence_bounds_inclusive() {
        for ok in [0, 100] {
            let v = json!({"action_segments_found": "no", "confidence_percentage": ok, "explanation": ""});
            assert_eq!(validate(v).unwrap().confidence_percentage, ok as u8);
        }
    }

    #[test]
    fn batch_survives_one_failing_segment() {
        let model = Arc::new(MockTextModel::from_fn(|prompt| {
            if prompt.contains("\"segment_id\": 3") {
                Err(ModelError::Rejected { status: 400, body: "bad request".into() })
            } else {
                Ok(YES.to_string())
            }
        }));
        let segments: Vec<Segment> = (1..=5).map(segment).collect();
        let analyzed = filter().analyze_segments(&segments, &gateway(model));

        assert_eq!(analyzed.len(), 5);
        let third = &analyzed[2];
        assert_eq!(third.segment.segment_id, 3);
        assert_eq!(third.action_analysis, ActionAnalysis::degraded());
        assert_eq!(third.action_analysis.confidence_percentage, 0);
        assert_eq!(third.action_analysis.action_segments_found, ActionFound::No);
        assert!(analyzed.iter().filter(|a| a.is_actionable()).count() == 4);
    }

    #[test]
    fn malformed_response_degrades_segment() {
        let model = Arc::new(MockTextModel::new("Yes, there is an action here."));
        let analyzed = filter().analyze_segments(&[segment(1)], &gateway(model));
        assert_eq!(analyzed[0].action_analysis, ActionAnalysis::degraded());
    }

    #[test]
    fn filter_keeps_only_yes() {
        let model = Arc::new(MockTextModel::from_fn(|prompt| {
            let verdict = if prompt.contains("\"segment_id\": 2") { "yes" } else { "no" };
            Ok(format!(
                r#"{{"action_segments_found": "{verdict}", "confidence_percentage": 70, "explanation": "e"}}"#
            ))
        }));
        let segments: Vec<Segment> = (1..=3).map(segment).collect();
        let actionable = filter().filter_for_actionable_segments(&segments, &gateway(model));
        assert_eq!(actionable.len(), 1);
        assert_eq!(actionable[0].segment.segment_id, 2);
    }
}
