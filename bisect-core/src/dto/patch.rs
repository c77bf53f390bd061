//! Patch DTOs
//!
//! Wire shape of the PATCH document: a list of JSON-Patch-style operations
//! with slash-delimited attribute paths.

use serde::{Deserialize, Serialize};

/// One patch operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchOp {
    pub op: PatchOpKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// Supported patch operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOpKind {
    Add,
    Replace,
    Remove,
}

impl std::fmt::Display for PatchOpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchOpKind::Add => write!(f, "add"),
            PatchOpKind::Replace => write!(f, "replace"),
            PatchOpKind::Remove => write!(f, "remove"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_patch_document() {
        let ops: Vec<PatchOp> =
            serde_json::from_str(r#"[{"op":"replace","path":"/gist","value":"new"}]"#).unwrap();

        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].op, PatchOpKind::Replace);
        assert_eq!(ops[0].path, "/gist");
        assert_eq!(ops[0].value, Some(serde_json::json!("new")));
    }

    #[test]
    fn test_unknown_op_error_names_the_op() {
        let result: Result<Vec<PatchOp>, _> =
            serde_json::from_str(r#"[{"op":"💩","path":"/gist","value":"x"}]"#);

        let err = result.unwrap_err().to_string();
        assert!(err.contains("💩"), "error should name the op: {}", err);
    }

    #[test]
    fn test_missing_path_rejected() {
        let result: Result<Vec<PatchOp>, _> = serde_json::from_str(r#"[{"op":"remove"}]"#);

        let err = result.unwrap_err().to_string();
        assert!(err.contains("path"), "error should name the field: {}", err);
    }
}
