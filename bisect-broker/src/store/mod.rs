//! Job Store
//!
//! In-memory data layer for the broker. Owns every job record, its version
//! counter and its accumulated log chunks for the process lifetime. The
//! write lock serializes mutations, so the PATCH sequence (read etag,
//! check, apply, bump) is atomic per job.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use bisect_core::domain::job::Job;
use bisect_core::dto::job::CreateJob;
use bisect_core::schema;

use crate::patch;

/// Store error type
#[derive(Debug)]
pub enum StoreError {
    NotFound(Uuid),
    PreconditionFailed,
    BadPatch(String),
}

struct JobEntry {
    job: Job,
    version: u64,
    log: Vec<Vec<u8>>,
}

/// In-memory job store keyed by id
#[derive(Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<Uuid, JobEntry>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a validated job, assigning id, creation time and version
    pub async fn create(&self, req: CreateJob) -> Uuid {
        let id = Uuid::new_v4();
        let job = Job {
            id,
            kind: req.kind,
            gist: req.gist,
            time_created: chrono::Utc::now().timestamp_millis(),
            time_started: req.time_started,
            time_done: req.time_done,
            platform: req.platform,
            bisect_range: req.bisect_range,
            result_bisect: req.result_bisect,
            bot_client_data: req.bot_client_data,
            error: req.error,
        };

        let mut jobs = self.jobs.write().await;
        jobs.insert(
            id,
            JobEntry {
                job,
                version: 1,
                log: Vec::new(),
            },
        );

        id
    }

    /// Fetch a job and its current ETag
    pub async fn get(&self, id: Uuid) -> Option<(Job, String)> {
        let jobs = self.jobs.read().await;
        jobs.get(&id)
            .map(|entry| (entry.job.clone(), etag(entry.version)))
    }

    /// Snapshot of every record's JSON projection, for scan-based filtering
    pub async fn snapshot(&self) -> Vec<(Uuid, Value)> {
        let jobs = self.jobs.read().await;
        jobs.iter()
            .filter_map(|(id, entry)| serde_json::to_value(&entry.job).ok().map(|v| (*id, v)))
            .collect()
    }

    /// Run the PATCH sequence for one job under the write lock: check the
    /// precondition, parse and apply the document, validate, commit.
    ///
    /// Nothing is committed until the patched record has passed the schema
    /// check; any failure leaves the record and its version untouched.
    pub async fn apply(
        &self,
        id: Uuid,
        if_match: &str,
        document: &Value,
    ) -> Result<String, StoreError> {
        let mut jobs = self.jobs.write().await;
        let entry = jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if if_match != etag(entry.version) {
            return Err(StoreError::PreconditionFailed);
        }

        let ops = patch::parse_ops(document).map_err(|e| StoreError::BadPatch(e.to_string()))?;

        let projection = match serde_json::to_value(&entry.job) {
            Ok(Value::Object(map)) => map,
            _ => return Err(StoreError::BadPatch("job record is not an object".to_string())),
        };

        let patched =
            patch::apply_ops(&projection, &ops).map_err(|e| StoreError::BadPatch(e.to_string()))?;

        schema::validate_record(&patched).map_err(|e| StoreError::BadPatch(e.to_string()))?;

        let job: Job = serde_json::from_value(Value::Object(patched))
            .map_err(|e| StoreError::BadPatch(format!("patched record is invalid: {}", e)))?;

        entry.job = job;
        entry.version += 1;

        Ok(etag(entry.version))
    }

    /// Append one raw chunk to a job's log
    pub async fn append_log(&self, id: Uuid, chunk: &[u8]) -> Option<()> {
        let mut jobs = self.jobs.write().await;
        let entry = jobs.get_mut(&id)?;
        entry.log.push(chunk.to_vec());
        Some(())
    }

    /// Read the accumulated log text for a job, one line per appended chunk
    pub async fn read_log(&self, id: Uuid) -> Option<String> {
        let jobs = self.jobs.read().await;
        let entry = jobs.get(&id)?;

        let mut bytes = Vec::new();
        for (i, chunk) in entry.log.iter().enumerate() {
            if i > 0 {
                bytes.push(b'\n');
            }
            bytes.extend_from_slice(chunk);
        }

        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn etag(version: u64) -> String {
    format!("\"{}\"", version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bisect_core::domain::job::JobKind;
    use serde_json::json;

    fn sample_create() -> CreateJob {
        CreateJob {
            kind: JobKind::Bisect,
            gist: "abc123".to_string(),
            time_started: None,
            time_done: None,
            platform: None,
            bisect_range: None,
            result_bisect: None,
            bot_client_data: None,
            error: None,
        }
    }

    fn replace_gist(value: &str) -> Value {
        json!([{ "op": "replace", "path": "/gist", "value": value }])
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = JobStore::new();
        let id = store.create(sample_create()).await;

        let (job, etag) = store.get(id).await.unwrap();
        assert_eq!(job.id, id);
        assert_eq!(job.gist, "abc123");
        assert!(!etag.is_empty());

        let age = chrono::Utc::now().timestamp_millis() - job.time_created;
        assert!((0..60_000).contains(&age));
    }

    #[tokio::test]
    async fn test_get_unknown_id() {
        let store = JobStore::new();
        assert!(store.get(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_apply_bumps_version() {
        let store = JobStore::new();
        let id = store.create(sample_create()).await;
        let (_, first_etag) = store.get(id).await.unwrap();

        let new_etag = store
            .apply(id, &first_etag, &replace_gist("new"))
            .await
            .unwrap();
        assert_ne!(new_etag, first_etag);

        let (job, current) = store.get(id).await.unwrap();
        assert_eq!(job.gist, "new");
        assert_eq!(current, new_etag);
    }

    #[tokio::test]
    async fn test_apply_stale_etag_is_a_noop() {
        let store = JobStore::new();
        let id = store.create(sample_create()).await;
        let (_, first_etag) = store.get(id).await.unwrap();

        store
            .apply(id, &first_etag, &replace_gist("new"))
            .await
            .unwrap();

        let result = store.apply(id, &first_etag, &replace_gist("newer")).await;
        assert!(matches!(result, Err(StoreError::PreconditionFailed)));

        let (job, _) = store.get(id).await.unwrap();
        assert_eq!(job.gist, "new");
    }

    #[tokio::test]
    async fn test_apply_schema_violation_is_a_noop() {
        let store = JobStore::new();
        let id = store.create(sample_create()).await;
        let (_, first_etag) = store.get(id).await.unwrap();

        let document = json!([{ "op": "add", "path": "/potrzebie", "value": "potrzebie" }]);
        let result = store.apply(id, &first_etag, &document).await;
        assert!(matches!(result, Err(StoreError::BadPatch(_))));

        let (job, current) = store.get(id).await.unwrap();
        assert_eq!(job.gist, "abc123");
        assert_eq!(current, first_etag);
    }

    #[tokio::test]
    async fn test_stale_etag_wins_over_malformed_document() {
        let store = JobStore::new();
        let id = store.create(sample_create()).await;
        let (_, first_etag) = store.get(id).await.unwrap();

        store
            .apply(id, &first_etag, &replace_gist("new"))
            .await
            .unwrap();

        let document = json!([{ "op": "💩", "path": "/gist", "value": "x" }]);
        let result = store.apply(id, &first_etag, &document).await;
        assert!(matches!(result, Err(StoreError::PreconditionFailed)));
    }

    #[tokio::test]
    async fn test_log_round_trip() {
        let store = JobStore::new();
        let id = store.create(sample_create()).await;

        assert_eq!(store.read_log(id).await.unwrap(), "");

        store.append_log(id, b"line 1").await.unwrap();
        store.append_log(id, b"line 2").await.unwrap();
        store.append_log(id, b"line 3").await.unwrap();

        let text = store.read_log(id).await.unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["line 1", "line 2", "line 3"]);
    }

    #[tokio::test]
    async fn test_log_unknown_id() {
        let store = JobStore::new();
        assert!(store.append_log(Uuid::new_v4(), b"x").await.is_none());
        assert!(store.read_log(Uuid::new_v4()).await.is_none());
    }
}
