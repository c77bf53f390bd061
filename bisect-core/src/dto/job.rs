//! Job DTOs

use serde::{Deserialize, Serialize};

use crate::domain::job::{JobKind, Platform, VersionRange};

/// Request to create a new job
///
/// `id` and `time_created` are assigned by the broker and have no place
/// here; everything else mirrors the job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateJob {
    #[serde(rename = "type")]
    pub kind: JobKind,
    pub gist: String,
    #[serde(default)]
    pub time_started: Option<i64>,
    #[serde(default)]
    pub time_done: Option<i64>,
    #[serde(default)]
    pub platform: Option<Platform>,
    #[serde(default)]
    pub bisect_range: Option<VersionRange>,
    #[serde(default)]
    pub result_bisect: Option<VersionRange>,
    #[serde(default)]
    pub bot_client_data: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}
