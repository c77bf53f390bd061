//! API Module
//!
//! HTTP API layer for the broker.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod job;
pub mod log;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post, put},
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::store::JobStore;
use self::error::ApiError;

/// Create the main API router with all endpoints
pub fn create_router(store: Arc<JobStore>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Job endpoints
        .route("/api/jobs", post(job::create_job))
        .route("/api/jobs", get(job::list_jobs))
        .route("/api/jobs/{id}", get(job::get_job))
        .route("/api/jobs/{id}", patch(job::patch_job))
        // Log endpoints
        .route("/api/jobs/{id}/log", put(log::append_log))
        .route("/log/{id}", get(log::read_log))
        // Add state and middleware
        .with_state(store)
        .layer(TraceLayer::new_for_http())
}

/// Parse a path id. Ids that are not UUIDs cannot name a job, so they map
/// to NotFound rather than a client error.
pub(crate) fn parse_job_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("Job {} not found", raw)))
}
