//! Pipeline orchestrator: transcript → action summary.
//!
//! segment → cluster → filter → extract → summarize
//!
//! Segmentation and clustering failures abort the run. Filtering and
//! extraction contain their failures per segment.

use std::fs;

use uuid::Uuid;

use super::clustering::Clusterer;
use super::error::{PipelineStage, StageError};
use super::extraction::ExtractionChain;
use super::filtering::ActionFilter;
use super::gateway::ModelGateway;
use super::model::{ModelInfo, ModelRegistry};
use super::prompt::{PromptKind, PromptSet};
use super::segmenter::Segmenter;
use super::types::PipelineSummary;
use super::PipelineError;
use crate::config::{AppConfig, PipelineSettings};

/// Treat `input` as a transcript file path when it looks like one, otherwise
/// as the transcript text itself.
pub fn resolve_transcript_input(input: &str, settings: &PipelineSettings) -> Result<String, PipelineError> {
    if settings.is_transcript_path(input) {
        tracing::info!(path = %input, "Reading transcript from file");
        Ok(fs::read_to_string(input)?)
    } else {
        Ok(input.to_string())
    }
}

/// A configured pipeline. Stateless between runs and safe to share.
pub struct ActionPipeline {
    gateway: ModelGateway,
    segmenter: Segmenter,
    clusterer: Clusterer,
    filter: ActionFilter,
    extraction: ExtractionChain,
    settings: PipelineSettings,
}

impl ActionPipeline {
    pub fn new(gateway: ModelGateway, prompts: &PromptSet, settings: PipelineSettings) -> Self {
        Self {
            gateway,
            segmenter: Segmenter::from_settings(&settings),
            clusterer: Clusterer::new(prompts.get(PromptKind::Clustering).clone()),
            filter: ActionFilter::new(prompts.get(PromptKind::Filtering).clone()),
            extraction: ExtractionChain::new(prompts),
            settings,
        }
    }

    /// Build the provider, gateway and prompt set described by `config`.
    pub fn from_config(config: &AppConfig, registry: &ModelRegistry) -> Result<Self, PipelineError> {
        let gateway = ModelGateway::from_config(&config.model, registry)?;
        let prompts = PromptSet::from_settings(&config.pipeline)?;
        Ok(Self::new(gateway, &prompts, config.pipeline.clone()))
    }

    pub fn model_info(&self) -> ModelInfo {
        self.gateway.info()
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Resolve `input` (text or `.txt` path) and run the pipeline on it.
    pub fn run_input(&self, input: &str) -> Result<PipelineSummary, StageError> {
        let transcript = resolve_transcript_input(input, &self.settings)
            .map_err(|e| StageError::new(PipelineStage::Input, e))?;
        self.run(&transcript)
    }

    /// Run the full pipeline on transcript text.
    pub fn run(&self, transcript: &str) -> Result<PipelineSummary, StageError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline_run", run_id = %run_id);
        let _guard = span.enter();

        let chunks = self
            .segmenter
            .transcript_to_chunks(transcript)
            .map_err(|e| abort(PipelineStage::Segmentation, e))?;
        tracing::info!(chunks = chunks.len(), "Chunked transcript");

        let segments = self
            .clusterer
            .chunks_to_segments(&chunks, &self.gateway)
            .map_err(|e| abort(PipelineStage::Clustering, e))?;

        let actionable = self
            .filter
            .filter_for_actionable_segments(&segments, &self.gateway);

        let results = self
            .extraction
            .extract_from_segments(&actionable, &self.gateway);

        let summary = PipelineSummary::from_results(results);
        tracing::info!(
            segments_processed = summary.total_segments_processed,
            actions_kept = summary.actions.len(),
            "Pipeline run complete"
        );
        Ok(summary)
    }
}

fn abort(stage: PipelineStage, source: PipelineError) -> StageError {
    tracing::error!(stage = %stage, error = %source, "Pipeline run aborted");
    StageError::new(stage, source)
}
