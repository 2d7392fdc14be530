//! Schema and descriptor errors
//!
//! Everything here is a configuration fault: raised at registration or
//! sealing time and expected to fail startup, never a request.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Schema registry and descriptor-derivation errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaError {
    #[error("resource '{resource}' declares no identity field")]
    MissingIdentity { resource: String },

    #[error("resource '{resource}' declares more than one identity field: {}", .fields.join(", "))]
    MultipleIdentity {
        resource: String,
        fields: Vec<String>,
    },

    #[error("resource '{0}' is already registered")]
    DuplicateResource(String),

    #[error("resource '{resource}' declares duplicate field '{field}'")]
    DuplicateField { resource: String, field: String },

    #[error("resource '{resource}' reserves field name '{field}'")]
    ReservedField { resource: String, field: String },

    #[error("resource '{resource}' extends unknown resource '{parent}'")]
    UnknownParent { resource: String, parent: String },

    #[error(
        "relation '{relation}' on resource '{resource}' targets unknown resource '{target}'"
    )]
    UnknownRelationTarget {
        resource: String,
        relation: String,
        target: String,
    },

    #[error("path '{path}' is claimed by both '{first}' and '{second}'")]
    DuplicatePath {
        path: String,
        first: String,
        second: String,
    },

    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    #[error("schema definition '{path}' is invalid: {reason}")]
    InvalidDefinition { path: String, reason: String },
}

/// One field's share of a constraint-violation report.
///
/// `message` joins all messages for the field with `", "`; `data` echoes the
/// offending value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredError {
    pub field: String,
    pub message: String,
    pub data: Value,
}
