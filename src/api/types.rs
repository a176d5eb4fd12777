//! Shared types for the HTTP layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::pipeline::model::ModelInfo;
use crate::pipeline::{ActionPipeline, PipelineSummary};

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all routes. The pipeline is stateless between runs,
/// so one instance serves every request.
#[derive(Clone)]
pub struct ApiContext {
    pub pipeline: Arc<ActionPipeline>,
}

impl ApiContext {
    pub fn new(pipeline: Arc<ActionPipeline>) -> Self {
        Self { pipeline }
    }
}

// ═══════════════════════════════════════════════════════════
// Request / response bodies
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct PipelineRequest {
    /// Raw transcript text.
    pub transcript: String,
}

#[derive(Debug, Serialize)]
pub struct PipelineResponse {
    pub clustered_items: PipelineSummary,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model: ModelInfo,
}
