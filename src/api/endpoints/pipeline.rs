//! Transcript processing endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, PipelineRequest, PipelineResponse};

/// `POST /pipeline`: run the full pipeline on a transcript.
///
/// The body is always treated as transcript text, never as a server-side
/// path. Model calls block (including backoff sleeps), so the run happens on
/// the blocking thread pool.
pub async fn run(
    State(ctx): State<ApiContext>,
    body: Result<Json<PipelineRequest>, JsonRejection>,
) -> Result<Json<PipelineResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let pipeline = ctx.pipeline.clone();
    let summary = tokio::task::spawn_blocking(move || pipeline.run(&request.transcript))
        .await
        .map_err(|e| ApiError::Internal(format!("pipeline task failed: {e}")))??;

    Ok(Json(PipelineResponse {
        clustered_items: summary,
    }))
}
