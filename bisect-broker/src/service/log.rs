//! Log Service
//!
//! Business logic for per-job log accumulation.

use uuid::Uuid;

use crate::store::JobStore;

/// Service error type
#[derive(Debug)]
pub enum LogError {
    JobNotFound(Uuid),
}

/// Append one raw chunk to a job's log
pub async fn append_chunk(store: &JobStore, id: Uuid, chunk: &[u8]) -> Result<(), LogError> {
    store
        .append_log(id, chunk)
        .await
        .ok_or(LogError::JobNotFound(id))?;

    tracing::debug!("Appended {} log bytes for job: {}", chunk.len(), id);

    Ok(())
}

/// Read the accumulated log text for a job
pub async fn read_log(store: &JobStore, id: Uuid) -> Result<String, LogError> {
    store.read_log(id).await.ok_or(LogError::JobNotFound(id))
}
