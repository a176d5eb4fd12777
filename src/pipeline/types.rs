use std::fmt;

use serde::{Deserialize, Serialize};

/// Assignee used when no one could be extracted.
pub const UNASSIGNED: &str = "Unassigned";
/// Deadline used when none could be extracted.
pub const NO_DEADLINE: &str = "No deadline";
/// Task text used when a segment carries no topic summary.
pub const NO_TASK_DESCRIPTION: &str = "No task description";

/// One speaker utterance, in transcript order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: usize,
    pub order: usize,
    pub content: String,
}

/// A topically grouped run of chunks with the model's summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub segment_id: i64,
    pub topic_summary: String,
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionFound {
    Yes,
    No,
}

/// The filter's verdict for one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAnalysis {
    pub action_segments_found: ActionFound,
    /// Always within 0..=100.
    pub confidence_percentage: u8,
    pub explanation: String,
}

impl ActionAnalysis {
    /// Verdict recorded when analysis of a segment failed.
    pub fn degraded() -> Self {
        Self {
            action_segments_found: ActionFound::No,
            confidence_percentage: 0,
            explanation: "Error occurred during analysis".to_string(),
        }
    }
}

/// A segment together with its action analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedSegment {
    #[serde(flatten)]
    pub segment: Segment,
    pub action_analysis: ActionAnalysis,
}

impl AnalyzedSegment {
    pub fn is_actionable(&self) -> bool {
        self.action_analysis.action_segments_found == ActionFound::Yes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn all() -> &'static [Priority] {
        &[Self::High, Self::Medium, Self::Low]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Exact, case-sensitive match against the label set.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::all().iter().copied().find(|p| p.as_str() == label)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    #[serde(rename = "Bug Fix")]
    BugFix,
    #[serde(rename = "Feature Development")]
    FeatureDevelopment,
    Research,
    Documentation,
    Meeting,
    #[default]
    Other,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Self::BugFix,
            Self::FeatureDevelopment,
            Self::Research,
            Self::Documentation,
            Self::Meeting,
            Self::Other,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BugFix => "Bug Fix",
            Self::FeatureDevelopment => "Feature Development",
            Self::Research => "Research",
            Self::Documentation => "Documentation",
            Self::Meeting => "Meeting",
            Self::Other => "Other",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.as_str() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One flattened action item extracted from an actionable segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub task: String,
    pub assignee: String,
    pub deadline: String,
    pub priority_level: Priority,
    pub category: Category,
}

impl ExtractionResult {
    /// True when assignee, deadline, priority and category all hold their
    /// fallback values. The task text is not considered.
    pub fn is_all_default(&self) -> bool {
        self.assignee == UNASSIGNED
            && self.deadline == NO_DEADLINE
            && self.priority_level == Priority::Medium
            && self.category == Category::Other
    }
}

/// Final report of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Actionable segments that reached extraction.
    pub total_segments_processed: usize,
    /// Same count as `total_segments_processed`: one action per segment.
    pub total_actions: usize,
    /// Results that differ from the all-default tuple, in segment order.
    pub actions: Vec<ExtractionResult>,
}

impl PipelineSummary {
    pub fn from_results(results: Vec<ExtractionResult>) -> Self {
        let processed = results.len();
        Self {
            total_segments_processed: processed,
            total_actions: processed,
            actions: results.into_iter().filter(|r| !r.is_all_default()).collect(),
        }
    }
}
