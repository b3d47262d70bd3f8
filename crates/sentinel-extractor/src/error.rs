//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Classifier (or the LLM behind it) failed
    #[error("Classification error: {0}")]
    Classification(String),

    /// A classify call exceeded the configured timeout
    #[error("Extraction timeout")]
    Timeout,

    /// Classifier output was not the expected shape
    #[error("Invalid incident format: {0}")]
    InvalidFormat(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}
