//! Job domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bisect job record
///
/// Structure shared between the broker (which persists it) and worker bots
/// (which report progress into it via PATCH). `id`, `type` and
/// `time_created` are assigned at creation and never change. Absent optional
/// attributes are omitted from the JSON projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Job {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: JobKind,
    pub gist: String,
    pub time_created: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_started: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_done: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bisect_range: Option<VersionRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_bisect: Option<VersionRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_client_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Kind of task a job carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Bisect,
}

/// Platform a job is pinned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Darwin,
    Linux,
    Win32,
}

/// Ordered `[good, bad]` pair of version strings bounding a bisect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange(pub String, pub String);

impl VersionRange {
    pub fn good(&self) -> &str {
        &self.0
    }

    pub fn bad(&self) -> &str {
        &self.1
    }
}
