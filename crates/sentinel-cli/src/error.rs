//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline run failed
    #[error("Run failed: {0}")]
    Pipeline(#[from] sentinel_pipeline::PipelineError),

    /// State store error
    #[error("Store error: {0}")]
    Store(#[from] sentinel_store::StoreError),

    /// LLM backend could not be set up
    #[error("LLM error: {0}")]
    Llm(#[from] sentinel_llm::LlmError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No stored state for the requested week
    #[error("No state stored for week {0}")]
    WeekNotFound(String),
}
