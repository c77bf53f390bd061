//! Job API Handlers
//!
//! HTTP endpoints for job creation, retrieval, filtering and patching.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::parse_job_id;
use crate::service::job_service;
use crate::store::JobStore;

/// POST /api/jobs
/// Validate and create a job; the response body is the id as plain text
pub async fn create_job(
    State(store): State<Arc<JobStore>>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let input: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::UnprocessableEntity(format!("invalid JSON body: {}", e)))?;

    let id = job_service::create_job(&store, input)
        .await
        .map_err(|e| match e {
            job_service::JobError::ValidationError(msg) => ApiError::UnprocessableEntity(msg),
            job_service::JobError::NotFound(id) => {
                ApiError::NotFound(format!("Job {} not found", id))
            }
            job_service::JobError::PreconditionFailed => precondition_failed(),
            job_service::JobError::BadPatch(msg) => ApiError::BadRequest(msg),
        })?;

    Ok((StatusCode::CREATED, id.to_string()))
}

/// GET /api/jobs/{id}
/// Fetch a job record; the ETag header carries the current version tag
pub async fn get_job(
    State(store): State<Arc<JobStore>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    tracing::debug!("Getting job: {}", id);

    let id = parse_job_id(&id)?;

    let (job, etag) = job_service::get_job(&store, id).await.map_err(|e| match e {
        job_service::JobError::NotFound(id) => ApiError::NotFound(format!("Job {} not found", id)),
        job_service::JobError::ValidationError(msg) => ApiError::UnprocessableEntity(msg),
        job_service::JobError::PreconditionFailed => precondition_failed(),
        job_service::JobError::BadPatch(msg) => ApiError::BadRequest(msg),
    })?;

    Ok(([(header::ETAG, etag)], Json(job)))
}

/// GET /api/jobs
/// List job ids matching the query-string filter clauses
pub async fn list_jobs(
    State(store): State<Arc<JobStore>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<Vec<Uuid>> {
    tracing::debug!("Listing jobs with {} filter clauses", params.len());

    let ids = job_service::list_jobs(&store, &params).await;

    Json(ids)
}

/// PATCH /api/jobs/{id}
/// Apply a patch document under If-Match; the new ETag is returned in the
/// response header
pub async fn patch_job(
    State(store): State<Arc<JobStore>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let id = parse_job_id(&id)?;

    let if_match = headers
        .get(header::IF_MATCH)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("missing If-Match header".to_string()))?;

    let document: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid patch document: {}", e)))?;

    let etag = job_service::patch_job(&store, id, if_match, document)
        .await
        .map_err(|e| match e {
            job_service::JobError::NotFound(id) => {
                ApiError::NotFound(format!("Job {} not found", id))
            }
            job_service::JobError::PreconditionFailed => precondition_failed(),
            job_service::JobError::BadPatch(msg) => ApiError::BadRequest(msg),
            job_service::JobError::ValidationError(msg) => ApiError::BadRequest(msg),
        })?;

    Ok((StatusCode::OK, [(header::ETAG, etag)]))
}

fn precondition_failed() -> ApiError {
    ApiError::PreconditionFailed("If-Match does not match the current ETag".to_string())
}
