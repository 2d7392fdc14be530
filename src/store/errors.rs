//! Store errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent-store faults
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// An insert collided with an existing row key
    #[error("duplicate key '{id}' in '{resource}'")]
    DuplicateKey { resource: String, id: String },

    /// Anything else the backend reports; surfaces as an internal fault
    #[error("storage fault: {0}")]
    Fault(String),
}

impl StoreError {
    pub fn fault(reason: impl Into<String>) -> Self {
        Self::Fault(reason.into())
    }
}
