//! Configuration for LLM backend selection

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which LLM backend answers classification prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI-compatible chat completions API
    OpenAi,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Backend to use
    #[serde(default)]
    pub backend: LlmBackend,

    /// Model name passed to the backend
    #[serde(default = "default_model")]
    pub model: String,

    /// Endpoint override; the backend default is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// API key (OpenAI); usually supplied through the environment
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Per-request HTTP timeout (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retry attempts for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_request_timeout_secs() -> u64 {
    crate::ollama::DEFAULT_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    crate::ollama::DEFAULT_MAX_RETRIES
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::default(),
            model: default_model(),
            endpoint: None,
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl LlmConfig {
    /// Endpoint to use for the selected backend
    pub fn endpoint_or_default(&self) -> String {
        match (&self.endpoint, self.backend) {
            (Some(endpoint), _) => endpoint.clone(),
            (None, LlmBackend::Ollama) => crate::ollama::DEFAULT_ENDPOINT.to_string(),
            (None, LlmBackend::OpenAi) => crate::openai::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Per-request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        if self.max_retries == 0 {
            return Err("max_retries must be at least 1".to_string());
        }
        Ok(())
    }
}
