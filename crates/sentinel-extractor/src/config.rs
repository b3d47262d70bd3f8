//! Configuration for the Extractor and Deduplicator

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for incident extraction and deduplication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Incidents below this confidence are discarded
    pub confidence_threshold: f64,

    /// Maximum candidates handed to one classify call
    pub max_candidates_per_call: usize,

    /// Maximum time for a single classify call (seconds)
    pub extraction_timeout_secs: u64,

    /// Normalized title similarity at which two incidents may be the same event
    pub title_similarity_threshold: f64,

    /// Maximum distance between first-seen dates for a title-based match
    pub date_window_days: i64,

    /// Cap on distinct key quotes kept per incident
    pub max_key_quotes: usize,

    /// Sentences kept from a classifier summary
    pub max_summary_sentences: usize,
}

impl ExtractorConfig {
    /// Get the extraction timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err("confidence_threshold must be within [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.title_similarity_threshold) {
            return Err("title_similarity_threshold must be within [0, 1]".to_string());
        }
        if self.max_candidates_per_call == 0 {
            return Err("max_candidates_per_call must be greater than 0".to_string());
        }
        if self.extraction_timeout_secs == 0 {
            return Err("extraction_timeout_secs must be greater than 0".to_string());
        }
        if self.date_window_days < 0 {
            return Err("date_window_days cannot be negative".to_string());
        }
        if self.max_key_quotes == 0 {
            return Err("max_key_quotes must be greater than 0".to_string());
        }
        if self.max_summary_sentences == 0 {
            return Err("max_summary_sentences must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            confidence_threshold: 0.3,
            max_candidates_per_call: 25,
            extraction_timeout_secs: 120,
            title_similarity_threshold: 0.8,
            date_window_days: 3,
            max_key_quotes: 3,
            max_summary_sentences: 2,
        }
    }
}

impl ExtractorConfig {
    /// Strict preset: only confident incidents, tighter title matching
    pub fn strict() -> Self {
        Self {
            confidence_threshold: 0.5,
            title_similarity_threshold: 0.9,
            date_window_days: 2,
            ..Self::default()
        }
    }

    /// Lenient preset: keep weaker signals, merge more eagerly, smaller batches
    pub fn lenient() -> Self {
        Self {
            confidence_threshold: 0.2,
            max_candidates_per_call: 15,
            extraction_timeout_secs: 300,
            title_similarity_threshold: 0.7,
            date_window_days: 5,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
