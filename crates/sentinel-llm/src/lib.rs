//! Sentinel LLM Provider Layer
//!
//! Pluggable LLM provider implementations behind the `LlmProvider` trait from
//! `sentinel-domain`. The classifier only ever sees the trait; which backend
//! answers is a configuration choice.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OllamaProvider`: Local Ollama API integration
//! - `OpenAiProvider`: OpenAI-compatible chat completions API
//! - `AnyProvider`: Configuration-selected variant of the two real backends
//!
//! # Examples
//!
//! ```
//! use sentinel_llm::MockProvider;
//! use sentinel_domain::traits::LlmProvider;
//!
//! # tokio_test_block(async {
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate("test prompt").await.unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use sentinel_domain::traits::LlmProvider as LlmProviderTrait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

pub use config::{LlmBackend, LlmConfig};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider misconfigured (missing key, bad endpoint)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Mock LLM provider for deterministic testing
///
/// This provider returns pre-configured responses without making any network calls.
/// Responses can be keyed on the exact prompt or on a substring of it, which
/// lets one mock answer differently per company.
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, String>>>,
    containing: Arc<Mutex<Vec<(String, String)>>>,
    call_count: Arc<Mutex<usize>>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            containing: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            delay: None,
        }
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(prompt.into(), response.into());
        }
    }

    /// Add a response for any prompt containing `needle`
    ///
    /// Checked after exact prompts, in insertion order.
    pub fn add_response_containing(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        if let Ok(mut containing) = self.containing.lock() {
            containing.push((needle.into(), response.into()));
        }
    }

    /// Configure to return an error for a specific prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        self.add_response(prompt, "ERROR");
    }

    /// Configure to return an error for any prompt containing `needle`
    pub fn add_error_containing(&mut self, needle: impl Into<String>) {
        self.add_response_containing(needle, "ERROR");
    }

    /// Sleep before answering (for timeout tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.call_count.lock().map(|c| *c).unwrap_or(0)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        if let Ok(mut count) = self.call_count.lock() {
            *count = 0;
        }
    }

    fn lookup(&self, prompt: &str) -> String {
        if let Some(response) = self.responses.lock().ok().and_then(|r| r.get(prompt).cloned()) {
            return response;
        }
        if let Ok(containing) = self.containing.lock() {
            if let Some((_, response)) = containing.iter().find(|(needle, _)| prompt.contains(needle.as_str())) {
                return response.clone();
            }
        }
        self.default_response.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        if let Ok(mut count) = self.call_count.lock() {
            *count += 1;
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.lookup(prompt);
        if response == "ERROR" {
            return Err(LlmError::Other("Mock error".to_string()));
        }
        Ok(response)
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// One of the real backends, chosen by configuration
///
/// ```
/// use sentinel_llm::{AnyProvider, LlmBackend, LlmConfig};
/// use sentinel_domain::traits::LlmProvider;
///
/// let mut config = LlmConfig::default();
/// config.backend = LlmBackend::Ollama;
/// config.model = "mistral".to_string();
/// let provider = AnyProvider::from_config(&config).unwrap();
/// assert_eq!(provider.model_name(), "mistral");
/// ```
pub enum AnyProvider {
    /// Local Ollama server
    Ollama(OllamaProvider),
    /// OpenAI-compatible API
    OpenAi(OpenAiProvider),
}

impl AnyProvider {
    /// Build the provider selected by `config`
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        config.validate().map_err(LlmError::Config)?;

        let provider = match config.backend {
            LlmBackend::Ollama => AnyProvider::Ollama(
                OllamaProvider::new(config.endpoint_or_default(), &config.model)
                    .with_timeout(config.request_timeout())
                    .with_max_retries(config.max_retries),
            ),
            LlmBackend::OpenAi => {
                let api_key = config
                    .api_key
                    .clone()
                    .ok_or_else(|| LlmError::Config("OpenAI backend requires an API key".to_string()))?;
                AnyProvider::OpenAi(
                    OpenAiProvider::new(api_key, &config.model)
                        .with_base_url(config.endpoint_or_default())
                        .with_timeout(config.request_timeout())
                        .with_max_retries(config.max_retries),
                )
            }
        };
        Ok(provider)
    }
}

#[async_trait]
impl LlmProviderTrait for AnyProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        match self {
            AnyProvider::Ollama(p) => p.generate(prompt).await,
            AnyProvider::OpenAi(p) => p.generate(prompt).await,
        }
    }

    fn model_name(&self) -> &str {
        match self {
            AnyProvider::Ollama(p) => p.model_name(),
            AnyProvider::OpenAi(p) => p.model_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate("any prompt").await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_specific_responses() {
        let mut provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.generate("hello").await.unwrap(), "world");
        assert_eq!(provider.generate("foo").await.unwrap(), "bar");
        assert_eq!(provider.generate("unknown").await.unwrap(), "Default mock response");
    }

    #[tokio::test]
    async fn test_mock_provider_containing() {
        let mut provider = MockProvider::new("[]");
        provider.add_response_containing("Company: Acme", "acme answer");
        provider.add_error_containing("Company: Globex");

        assert_eq!(provider.generate("... Company: Acme ...").await.unwrap(), "acme answer");
        assert!(provider.generate("... Company: Globex ...").await.is_err());
        assert_eq!(provider.generate("Company: Initech").await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");

        assert_eq!(provider.call_count(), 0);

        provider.generate("prompt1").await.unwrap();
        assert_eq!(provider.call_count(), 1);

        provider.generate("prompt2").await.unwrap();
        assert_eq!(provider.call_count(), 2);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad prompt");

        let result = provider.generate("bad prompt").await;
        assert!(matches!(result, Err(LlmError::Other(_))));
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate("test").await.unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[test]
    fn test_any_provider_openai_requires_key() {
        let config = LlmConfig {
            backend: LlmBackend::OpenAi,
            api_key: None,
            ..LlmConfig::default()
        };
        assert!(matches!(AnyProvider::from_config(&config), Err(LlmError::Config(_))));
    }

    #[test]
    fn test_any_provider_selects_backend() {
        let config = LlmConfig {
            backend: LlmBackend::OpenAi,
            model: "gpt-4o-mini".to_string(),
            api_key: Some("sk-test".to_string()),
            ..LlmConfig::default()
        };
        let provider = AnyProvider::from_config(&config).unwrap();
        assert!(matches!(provider, AnyProvider::OpenAi(_)));
        assert_eq!(provider.model_name(), "gpt-4o-mini");
    }
}
