//! Log API Handlers
//!
//! HTTP endpoints for appending and reading per-job logs.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::api::error::{ApiError, ApiResult};
use crate::api::parse_job_id;
use crate::service::log_service;
use crate::store::JobStore;

/// PUT /api/jobs/{id}/log
/// Append the raw request body to the job's log
pub async fn append_log(
    State(store): State<Arc<JobStore>>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let id = parse_job_id(&id)?;

    log_service::append_chunk(&store, id, &body)
        .await
        .map_err(|e| match e {
            log_service::LogError::JobNotFound(id) => {
                ApiError::NotFound(format!("Job {} not found", id))
            }
        })?;

    Ok(StatusCode::OK)
}

/// GET /log/{id}
/// Return the accumulated log as plain text
pub async fn read_log(
    State(store): State<Arc<JobStore>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    tracing::debug!("Reading log for job: {}", id);

    let id = parse_job_id(&id)?;

    let text = log_service::read_log(&store, id).await.map_err(|e| match e {
        log_service::LogError::JobNotFound(id) => {
            ApiError::NotFound(format!("Job {} not found", id))
        }
    })?;

    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}
