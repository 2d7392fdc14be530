//! Service errors
//!
//! The tagged failure taxonomy for every operation. Failures are raised at
//! the point of detection and propagate unmodified to the REST boundary,
//! which owns the mapping to external statuses; nothing in between
//! re-interprets a failure's kind.

use thiserror::Error;

use crate::filter::FilterError;
use crate::schema::{SchemaError, StructuredError};
use crate::store::StoreError;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Distinguishes idempotency conditions on relation and create conflicts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictCode {
    ResourceAlreadyExists = 10,
    ResourceDoesNotExist = 20,
    RelatedResourceAlreadyExists = 30,
}

impl ConflictCode {
    pub fn code(&self) -> u16 {
        *self as u16
    }
}

/// Typed operation failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    #[error("payload tenant '{payload}' does not match request tenant '{request}'")]
    TenantMismatch { request: String, payload: String },

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("unsupported patch operation '{0}'")]
    UnsupportedPatchOp(String),

    #[error("resource '{resource}' with id '{id}' does not exist")]
    NotFound { resource: String, id: String },

    /// Aggregated: every unresolvable related id, never just the first
    #[error("resources of type '{resource}' do not exist: {}", .ids.join(", "))]
    MissingRelated { resource: String, ids: Vec<String> },

    /// Aggregated: ids a detach named that are not currently related
    #[error("resources of type '{resource}' are not related: {}", .ids.join(", "))]
    NotRelated { resource: String, ids: Vec<String> },

    #[error("constraint violation on: {}", .errors.iter().map(|e| e.field.as_str()).collect::<Vec<_>>().join(", "))]
    ConstraintViolation { errors: Vec<StructuredError> },

    #[error("{message}")]
    Conflict {
        code: ConflictCode,
        message: String,
    },

    /// Internal consistency fault: a by-identity query returned several rows
    #[error("unexpected query result for id '{0}'")]
    UnexpectedQueryResult(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn illegal(reason: impl Into<String>) -> Self {
        Self::IllegalArgument(reason.into())
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPayload(reason.into())
    }

    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn conflict(code: ConflictCode, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_codes_are_stable() {
        assert_eq!(ConflictCode::ResourceAlreadyExists.code(), 10);
        assert_eq!(ConflictCode::ResourceDoesNotExist.code(), 20);
        assert_eq!(ConflictCode::RelatedResourceAlreadyExists.code(), 30);
    }

    #[test]
    fn test_missing_related_lists_every_id() {
        let err = ServiceError::MissingRelated {
            resource: "session".into(),
            ids: vec!["s1".into(), "s2".into(), "s3".into()],
        };
        assert_eq!(
            err.to_string(),
            "resources of type 'session' do not exist: s1, s2, s3"
        );
    }
}
