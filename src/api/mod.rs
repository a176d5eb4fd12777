//! HTTP API for the action-item pipeline.
//!
//! A thin layer over `ActionPipeline`: `POST /pipeline` runs a transcript,
//! `GET /health` reports liveness and the configured model. The router is
//! composable, so `api_router()` can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use server::{start_api_server, ApiServer};
pub use types::ApiContext;
