//! REST boundary errors
//!
//! The single place where a typed failure is mapped to an external status
//! and message. Server faults are logged with full detail here and leave
//! the process as a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::observability::Logger;
use crate::schema::{SchemaError, StructuredError};
use crate::service::{ConflictCode, ServiceError};

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

/// REST boundary errors
#[derive(Debug, Error)]
pub enum RestError {
    /// Invalid query parameter
    #[error("invalid query parameter: {0}")]
    InvalidQueryParam(String),

    /// Missing required parameter
    #[error("missing required parameter: {0}")]
    MissingParam(String),

    /// Requested page size beyond the maximum
    #[error("page size {0} exceeds maximum {1}")]
    SizeExceeded(usize, usize),

    /// Startup-time misconfiguration (unknown request parameter name)
    #[error("unknown request parameter '{0}'")]
    Configuration(String),

    /// Typed failure from the service layer
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl RestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::InvalidQueryParam(_)
            | RestError::MissingParam(_)
            | RestError::SizeExceeded(_, _) => StatusCode::BAD_REQUEST,

            RestError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,

            RestError::Service(err) => match err {
                ServiceError::Filter(_)
                | ServiceError::IllegalArgument(_)
                | ServiceError::TenantMismatch { .. }
                | ServiceError::MalformedPayload(_)
                | ServiceError::UnsupportedPatchOp(_)
                | ServiceError::ConstraintViolation { .. }
                | ServiceError::Conflict { .. } => StatusCode::BAD_REQUEST,

                ServiceError::NotFound { .. }
                | ServiceError::MissingRelated { .. }
                | ServiceError::NotRelated { .. }
                | ServiceError::Schema(SchemaError::UnknownResource(_)) => {
                    StatusCode::NOT_FOUND
                }

                ServiceError::UnexpectedQueryResult(_)
                | ServiceError::Store(_)
                | ServiceError::Schema(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Distinguishing code on conflict-class failures
    fn error_code(&self) -> Option<u16> {
        match self {
            RestError::Service(ServiceError::Conflict { code, .. }) => Some(code.code()),
            RestError::Service(ServiceError::NotRelated { .. }) => {
                Some(ConflictCode::ResourceDoesNotExist.code())
            }
            _ => None,
        }
    }

    fn details(&self) -> Option<Vec<StructuredError>> {
        match self {
            RestError::Service(ServiceError::ConstraintViolation { errors }) => {
                Some(errors.clone())
            }
            _ => None,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<StructuredError>>,
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status.is_server_error() {
            Logger::error(
                "request_failed",
                &[
                    ("detail", self.to_string().as_str()),
                    ("status", status.as_str()),
                ],
            );
            "internal error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: message,
            code: status.as_u16(),
            error_code: self.error_code(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}
