//! Patch Engine
//!
//! Applies add/replace/remove operations to a job's JSON projection. The
//! structural and readonly checks run over the whole op list before
//! anything is applied, so a rejected document leaves the record untouched.

use serde_json::{Map, Value};

use bisect_core::dto::patch::{PatchOp, PatchOpKind};
use bisect_core::schema;

/// Patch application error; the message names the offending op or path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchError(pub String);

impl std::fmt::Display for PatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PatchError {}

/// Parse a patch document into its operation list.
///
/// Runs after the precondition check, so a stale ETag wins over a
/// malformed document.
pub fn parse_ops(document: &Value) -> Result<Vec<PatchOp>, PatchError> {
    serde_json::from_value(document.clone())
        .map_err(|e| PatchError(format!("invalid patch document: {}", e)))
}

/// Apply a patch document to a record, returning the patched working copy.
pub fn apply_ops(
    record: &Map<String, Value>,
    ops: &[PatchOp],
) -> Result<Map<String, Value>, PatchError> {
    for op in ops {
        check_op(op)?;
    }

    let mut working = record.clone();
    for op in ops {
        apply_one(&mut working, op)?;
    }

    Ok(working)
}

fn check_op(op: &PatchOp) -> Result<(), PatchError> {
    if !op.path.starts_with('/') || op.path.len() == 1 {
        return Err(PatchError(format!("invalid patch path `{}`", op.path)));
    }

    for readonly in schema::READONLY {
        let prefix = format!("/{}", readonly);
        if op.path == prefix || op.path.starts_with(&format!("{}/", prefix)) {
            return Err(PatchError(format!(
                "`{}` targets the readonly attribute `{}`",
                op.path, readonly
            )));
        }
    }

    match op.op {
        PatchOpKind::Add | PatchOpKind::Replace if op.value.is_none() => Err(PatchError(format!(
            "op `{}` at `{}` requires a value",
            op.op, op.path
        ))),
        _ => Ok(()),
    }
}

fn apply_one(working: &mut Map<String, Value>, op: &PatchOp) -> Result<(), PatchError> {
    let segments: Vec<&str> = op.path[1..].split('/').collect();

    if segments.len() == 1 {
        let attr = segments[0];
        return match op.op {
            // Top-level add and replace are both setters.
            PatchOpKind::Add | PatchOpKind::Replace => {
                working.insert(attr.to_string(), required_value(op)?);
                Ok(())
            }
            PatchOpKind::Remove => match working.remove(attr) {
                Some(_) => Ok(()),
                None => Err(PatchError(format!("no value at `{}`", op.path))),
            },
        };
    }

    let last = segments[segments.len() - 1];
    let parent = resolve_parent(working, &segments, &op.path)?;

    match op.op {
        PatchOpKind::Add => {
            parent.insert(last.to_string(), required_value(op)?);
            Ok(())
        }
        PatchOpKind::Replace => {
            if !parent.contains_key(last) {
                return Err(PatchError(format!("no value at `{}`", op.path)));
            }
            parent.insert(last.to_string(), required_value(op)?);
            Ok(())
        }
        PatchOpKind::Remove => match parent.remove(last) {
            Some(_) => Ok(()),
            None => Err(PatchError(format!("no value at `{}`", op.path))),
        },
    }
}

fn required_value(op: &PatchOp) -> Result<Value, PatchError> {
    op.value.clone().ok_or_else(|| {
        PatchError(format!("op `{}` at `{}` requires a value", op.op, op.path))
    })
}

/// Walk to the mapping holding the path's final segment. Intermediate
/// segments must already exist and be mappings.
fn resolve_parent<'a>(
    working: &'a mut Map<String, Value>,
    segments: &[&str],
    path: &str,
) -> Result<&'a mut Map<String, Value>, PatchError> {
    let mut current = working;
    for segment in &segments[..segments.len() - 1] {
        current = current
            .get_mut(*segment)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| PatchError(format!("no value at `{}`", path)))?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Map<String, Value> {
        match json!({
            "id": "8bb1d922-ea23-490e-b417-9cb80be4857b",
            "type": "bisect",
            "gist": "abc",
            "time_created": 1_700_000_000_000_i64,
            "bot_client_data": { "hello": { "world": 1 } },
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn op(kind: PatchOpKind, path: &str, value: Option<Value>) -> PatchOp {
        PatchOp {
            op: kind,
            path: path.to_string(),
            value,
        }
    }

    #[test]
    fn test_replace_sets_top_level_value() {
        let patched = apply_ops(
            &record(),
            &[op(PatchOpKind::Replace, "/gist", Some(json!("new")))],
        )
        .unwrap();
        assert_eq!(patched["gist"], "new");
    }

    #[test]
    fn test_add_and_replace_both_set_absent_top_level_attributes() {
        for kind in [PatchOpKind::Add, PatchOpKind::Replace] {
            let patched = apply_ops(
                &record(),
                &[op(kind, "/platform", Some(json!("linux")))],
            )
            .unwrap();
            assert_eq!(patched["platform"], "linux");
        }
    }

    #[test]
    fn test_remove_top_level_value() {
        let patched = apply_ops(&record(), &[op(PatchOpKind::Remove, "/bot_client_data", None)])
            .unwrap();
        assert!(!patched.contains_key("bot_client_data"));
    }

    #[test]
    fn test_remove_missing_value_rejected() {
        let err = apply_ops(&record(), &[op(PatchOpKind::Remove, "/platform", None)])
            .unwrap_err();
        assert!(err.0.contains("/platform"));
    }

    #[test]
    fn test_readonly_paths_rejected() {
        for path in ["/id", "/type", "/time_created"] {
            let err = apply_ops(
                &record(),
                &[op(PatchOpKind::Replace, path, Some(json!("poop")))],
            )
            .unwrap_err();
            assert!(err.0.contains(path), "{} should be readonly", path);
        }
    }

    #[test]
    fn test_readonly_guard_covers_descendants() {
        let err = apply_ops(
            &record(),
            &[op(PatchOpKind::Add, "/id/sneaky", Some(json!(1)))],
        )
        .unwrap_err();
        assert!(err.0.contains("readonly"));
    }

    #[test]
    fn test_missing_value_rejected() {
        let err = apply_ops(&record(), &[op(PatchOpKind::Replace, "/gist", None)]).unwrap_err();
        assert!(err.0.contains("/gist"));
    }

    #[test]
    fn test_bad_path_rejected() {
        for path in ["", "/", "gist"] {
            let err = apply_ops(
                &record(),
                &[op(PatchOpKind::Replace, path, Some(json!("x")))],
            )
            .unwrap_err();
            assert!(err.0.contains("path"), "`{}` should be rejected", path);
        }
    }

    #[test]
    fn test_nested_replace_requires_existing_target() {
        let patched = apply_ops(
            &record(),
            &[op(
                PatchOpKind::Replace,
                "/bot_client_data/hello",
                Some(json!(2)),
            )],
        )
        .unwrap();
        assert_eq!(patched["bot_client_data"]["hello"], 2);

        let err = apply_ops(
            &record(),
            &[op(
                PatchOpKind::Replace,
                "/bot_client_data/missing",
                Some(json!(2)),
            )],
        )
        .unwrap_err();
        assert!(err.0.contains("/bot_client_data/missing"));
    }

    #[test]
    fn test_nested_add_requires_existing_parent() {
        let patched = apply_ops(
            &record(),
            &[op(
                PatchOpKind::Add,
                "/bot_client_data/hello/there",
                Some(json!("general")),
            )],
        )
        .unwrap();
        assert_eq!(patched["bot_client_data"]["hello"]["there"], "general");

        let err = apply_ops(
            &record(),
            &[op(PatchOpKind::Add, "/error/details", Some(json!("x")))],
        )
        .unwrap_err();
        assert!(err.0.contains("/error/details"));
    }

    #[test]
    fn test_nested_remove() {
        let patched = apply_ops(
            &record(),
            &[op(PatchOpKind::Remove, "/bot_client_data/hello/world", None)],
        )
        .unwrap();
        assert_eq!(patched["bot_client_data"]["hello"], json!({}));
    }

    #[test]
    fn test_ops_apply_in_order() {
        let patched = apply_ops(
            &record(),
            &[
                op(PatchOpKind::Replace, "/gist", Some(json!("first"))),
                op(PatchOpKind::Replace, "/gist", Some(json!("second"))),
            ],
        )
        .unwrap();
        assert_eq!(patched["gist"], "second");
    }

    #[test]
    fn test_rejection_leaves_input_unchanged() {
        let original = record();
        let err = apply_ops(
            &original,
            &[
                op(PatchOpKind::Replace, "/gist", Some(json!("new"))),
                op(PatchOpKind::Remove, "/platform", None),
            ],
        )
        .unwrap_err();
        assert!(err.0.contains("/platform"));
        assert_eq!(original["gist"], "abc");
    }
}
