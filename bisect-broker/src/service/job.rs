//! Job Service
//!
//! Business logic for job creation, retrieval, filtering and patching.

use serde_json::Value;
use uuid::Uuid;

use bisect_core::domain::job::Job;
use bisect_core::dto::job::CreateJob;
use bisect_core::schema;

use crate::query;
use crate::store::{JobStore, StoreError};

/// Service error type
#[derive(Debug)]
pub enum JobError {
    NotFound(Uuid),
    ValidationError(String),
    PreconditionFailed,
    BadPatch(String),
}

impl From<StoreError> for JobError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => JobError::NotFound(id),
            StoreError::PreconditionFailed => JobError::PreconditionFailed,
            StoreError::BadPatch(msg) => JobError::BadPatch(msg),
        }
    }
}

/// Validate a create request and insert the job
pub async fn create_job(store: &JobStore, input: Value) -> Result<Uuid, JobError> {
    let map = input
        .as_object()
        .ok_or_else(|| JobError::ValidationError("request body must be a JSON object".to_string()))?;

    schema::validate_create(map).map_err(|e| JobError::ValidationError(e.to_string()))?;

    let req: CreateJob =
        serde_json::from_value(input).map_err(|e| JobError::ValidationError(e.to_string()))?;

    let id = store.create(req).await;

    tracing::info!("Job created: {}", id);

    Ok(id)
}

/// Get a job and its current ETag
pub async fn get_job(store: &JobStore, id: Uuid) -> Result<(Job, String), JobError> {
    store.get(id).await.ok_or(JobError::NotFound(id))
}

/// List ids of jobs matching every filter clause
pub async fn list_jobs(store: &JobStore, params: &[(String, String)]) -> Vec<Uuid> {
    let clauses = query::parse_filters(params);

    store
        .snapshot()
        .await
        .into_iter()
        .filter(|(_, record)| query::matches(record, &clauses))
        .map(|(id, _)| id)
        .collect()
}

/// Apply a patch document under optimistic concurrency
pub async fn patch_job(
    store: &JobStore,
    id: Uuid,
    if_match: &str,
    document: Value,
) -> Result<String, JobError> {
    let etag = store.apply(id, if_match, &document).await?;

    tracing::info!("Job patched: {}", id);

    Ok(etag)
}
