//! Health check endpoint.

use axum::extract::State;
use axum::Json;

use crate::api::types::{ApiContext, HealthResponse};

/// `GET /health`: liveness plus the configured model.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        model: ctx.pipeline.model_info(),
    })
}
