//! HTTP router for the action-item pipeline.
//!
//! Returns a composable `Router` that can be mounted on any axum server.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::pipeline::ActionPipeline;

/// Build the API router around a shared pipeline.
pub fn api_router(pipeline: Arc<ActionPipeline>) -> Router {
    build_router(ApiContext::new(pipeline))
}

fn build_router(ctx: ApiContext) -> Router {
    // .with_state() turns Router<ApiContext> into Router<()> so the
    // from_fn access log layer (state = ()) composes on top.
    Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/pipeline", post(endpoints::pipeline::run))
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::access_log::log_access))
}
