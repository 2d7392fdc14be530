//! Patch document parsing
//!
//! An update body is a JSON array of `{op, path, value}` operations. Only
//! `replace` is supported; any other operation name fails before the service
//! touches the store. Paths address one top-level field, with or without a
//! leading slash.

use serde_json::Value;

use super::errors::{ServiceError, ServiceResult};

/// One parsed replace operation
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOp {
    pub field: String,
    pub value: Value,
}

/// Parse and check a patch body.
pub fn parse_patch(body: &Value) -> ServiceResult<Vec<PatchOp>> {
    let ops = body
        .as_array()
        .ok_or_else(|| ServiceError::malformed("patch body must be an array of operations"))?;

    let mut parsed = Vec::with_capacity(ops.len());
    for op in ops {
        let obj = op
            .as_object()
            .ok_or_else(|| ServiceError::malformed("patch operation must be an object"))?;

        let name = obj
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| ServiceError::malformed("patch operation is missing 'op'"))?;
        if name != "replace" {
            return Err(ServiceError::UnsupportedPatchOp(name.to_string()));
        }

        let path = obj
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| ServiceError::malformed("patch operation is missing 'path'"))?;
        let field = path.strip_prefix('/').unwrap_or(path);
        if field.is_empty() || field.contains('/') {
            return Err(ServiceError::malformed(format!(
                "patch path '{path}' must address one top-level field"
            )));
        }

        let value = obj
            .get("value")
            .cloned()
            .ok_or_else(|| ServiceError::malformed("patch operation is missing 'value'"))?;

        parsed.push(PatchOp {
            field: field.to_string(),
            value,
        });
    }

    Ok(parsed)
}
