//! Structured logging for the engine

mod logger;

pub use logger::{Logger, Severity};
