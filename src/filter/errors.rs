//! Filter translation errors

use thiserror::Error;

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;

/// Filter parsing and predicate-compilation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The expression or one of its literals is malformed
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// A criteria names a field the resource type does not declare
    #[error("unknown property '{property}' on resource '{resource}'")]
    UnknownProperty { property: String, resource: String },
}

impl FilterError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidFilter(reason.into())
    }
}
