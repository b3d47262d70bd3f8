//! Error types for pipeline runs

use thiserror::Error;

/// Errors that abort a pipeline run
///
/// Per-company failures never surface here; they are recorded in the report's
/// error section. Only persistence and configuration problems are fatal.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Prior state unreadable or current state unwritable
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
