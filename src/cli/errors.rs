//! CLI errors

use thiserror::Error;

use crate::rest_api::RestError;
use crate::schema::SchemaError;

/// Result type for CLI commands
pub type CliResult<T> = Result<T, CliError>;

/// Top-level command failures
#[derive(Debug, Error)]
pub enum CliError {
    #[error("schema configuration error: {0}")]
    Schema(#[from] SchemaError),

    #[error("server configuration error: {0}")]
    Rest(#[from] RestError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
