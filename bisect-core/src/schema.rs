//! Job schema
//!
//! The attribute registry and the validation run on every create and patch.
//! Validation works on the raw JSON mapping, before any typed deserialize,
//! so error messages can name the offending attribute and value.

use semver::Version;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Every attribute a job record may carry.
pub const ATTRIBUTES: &[&str] = &[
    "id",
    "type",
    "gist",
    "time_created",
    "time_started",
    "time_done",
    "platform",
    "bisect_range",
    "result_bisect",
    "bot_client_data",
    "error",
];

/// Attributes set at creation and never mutated.
pub const READONLY: &[&str] = &["id", "type", "time_created"];

/// Attributes the broker assigns itself; clients may not supply them.
pub const SERVER_ASSIGNED: &[&str] = &["id", "time_created"];

pub const JOB_KINDS: &[&str] = &["bisect"];
pub const PLATFORMS: &[&str] = &["darwin", "linux", "win32"];

/// Schema violation; the message names the offending attribute or value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError(pub String);

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SchemaError {}

/// A coerced filter atom: either the "attribute absent" sentinel or a JSON
/// value to compare against.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterAtom {
    Absent,
    Value(Value),
}

/// Validate a create request.
///
/// Requires `gist` and `type`, rejects unknown and server-assigned keys,
/// and runs the per-attribute predicates.
pub fn validate_create(input: &Map<String, Value>) -> Result<(), SchemaError> {
    for key in input.keys() {
        if !ATTRIBUTES.contains(&key.as_str()) {
            return Err(SchemaError(format!("unknown attribute `{}`", key)));
        }
        if SERVER_ASSIGNED.contains(&key.as_str()) {
            return Err(SchemaError(format!(
                "`{}` is assigned by the broker and cannot be supplied",
                key
            )));
        }
    }

    for required in ["gist", "type"] {
        if !input.contains_key(required) {
            return Err(SchemaError(format!(
                "missing required attribute `{}`",
                required
            )));
        }
    }

    for (key, value) in input {
        validate_value(key, value)?;
    }

    Ok(())
}

/// Validate a full record, e.g. the working copy after a patch.
///
/// Same per-attribute predicates as creation, with the server-assigned
/// attributes present and checked rather than forbidden.
pub fn validate_record(record: &Map<String, Value>) -> Result<(), SchemaError> {
    for key in record.keys() {
        if !ATTRIBUTES.contains(&key.as_str()) {
            return Err(SchemaError(format!("unknown attribute `{}`", key)));
        }
    }

    for required in ["id", "type", "gist", "time_created"] {
        if !record.contains_key(required) {
            return Err(SchemaError(format!(
                "missing required attribute `{}`",
                required
            )));
        }
    }

    for (key, value) in record {
        validate_value(key, value)?;
    }

    Ok(())
}

/// Coerce one query-string atom into the value used for comparison.
///
/// String-typed declared attributes compare as strings; the timestamp
/// attributes compare as integers; everything else (the open-typed
/// `bot_client_data` tree and unknown paths) parses the atom as a JSON
/// literal, falling back to a string. The literal `undefined` is the
/// absence sentinel.
pub fn coerce_filter_atom(path: &str, raw: &str) -> FilterAtom {
    if raw == "undefined" {
        return FilterAtom::Absent;
    }

    let root = path.split('.').next().unwrap_or(path);

    let value = match root {
        "id" | "type" | "gist" | "error" | "platform" => Value::String(raw.to_string()),
        "time_created" | "time_started" | "time_done" => match raw.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(raw.to_string()),
        },
        _ => match serde_json::from_str::<Value>(raw) {
            Ok(parsed) => parsed,
            Err(_) => Value::String(raw.to_string()),
        },
    };

    FilterAtom::Value(value)
}

fn validate_value(attr: &str, value: &Value) -> Result<(), SchemaError> {
    if value.is_null() {
        return match attr {
            "id" | "type" | "gist" | "time_created" => {
                Err(SchemaError(format!("`{}` must not be null", attr)))
            }
            _ => Ok(()),
        };
    }

    match attr {
        "id" => match value.as_str().map(Uuid::parse_str) {
            Some(Ok(_)) => Ok(()),
            _ => Err(SchemaError("`id` must be a UUID string".to_string())),
        },
        "type" => match value.as_str() {
            Some(s) if JOB_KINDS.contains(&s) => Ok(()),
            Some(s) => Err(SchemaError(format!(
                "`type` must be one of {}, got `{}`",
                JOB_KINDS.join(", "),
                s
            ))),
            None => Err(SchemaError("`type` must be a string".to_string())),
        },
        "gist" | "error" => match value.as_str() {
            Some(_) => Ok(()),
            None => Err(SchemaError(format!("`{}` must be a string", attr))),
        },
        "time_created" | "time_started" | "time_done" => match value.as_i64() {
            Some(_) => Ok(()),
            None => Err(SchemaError(format!(
                "`{}` must be an integer millisecond timestamp",
                attr
            ))),
        },
        "platform" => match value.as_str() {
            Some(s) if PLATFORMS.contains(&s) => Ok(()),
            Some(s) => Err(SchemaError(format!(
                "`platform` must be one of {}, got `{}`",
                PLATFORMS.join(", "),
                s
            ))),
            None => Err(SchemaError("`platform` must be a string".to_string())),
        },
        "bisect_range" | "result_bisect" => validate_version_range(attr, value),
        "bot_client_data" => Ok(()),
        _ => Err(SchemaError(format!("unknown attribute `{}`", attr))),
    }
}

fn validate_version_range(attr: &str, value: &Value) -> Result<(), SchemaError> {
    let items = match value.as_array() {
        Some(items) if items.len() == 2 => items,
        _ => {
            return Err(SchemaError(format!(
                "`{}` must be a two-element array of versions",
                attr
            )));
        }
    };

    for item in items {
        let text = item.as_str().ok_or_else(|| {
            SchemaError(format!("`{}` elements must be version strings", attr))
        })?;
        Version::parse(text).map_err(|_| {
            SchemaError(format!(
                "`{}` elements must be semantic versions, got `{}`",
                attr, text
            ))
        })?;
    }

    Ok(())
}
