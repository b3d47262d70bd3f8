//! Configuration for weekly pipeline runs
//!
//! Defines the worker pool size, the per-company time budget and how far
//! before the reported week news may reach.

use chrono::NaiveDate;
use sentinel_domain::WeekKey;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on `lookback_days`
pub const MAX_LOOKBACK_DAYS: u32 = 28;

/// Configuration for the Pipeline runner
///
/// # Examples
///
/// ```
/// use sentinel_pipeline::PipelineConfig;
///
/// // Default configuration (balanced)
/// let config = PipelineConfig::default();
/// assert_eq!(config.max_concurrency, 4);
///
/// // Sequential processing, generous time budget
/// let config = PipelineConfig::conservative();
/// assert_eq!(config.max_concurrency, 1);
///
/// // Wide fan-out for large portfolios
/// let config = PipelineConfig::aggressive();
/// assert_eq!(config.max_concurrency, 16);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Companies processed concurrently
    /// Default: 4
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Time budget for one company's fetch, extraction and dedupe (seconds)
    /// Default: 300
    #[serde(default = "default_company_timeout_secs")]
    pub company_timeout_secs: u64,

    /// Extra days before the reported week's Monday to include
    ///
    /// The window always ends on the week's Sunday. Any overlap re-reads the
    /// end of the previous week, so its incidents cannot resolve until they
    /// fall out of the overlap.
    /// Default: 0
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Run everything but skip the final save
    /// Default: false
    #[serde(default)]
    pub dry_run: bool,
}

fn default_max_concurrency() -> usize {
    4
}

fn default_company_timeout_secs() -> u64 {
    300
}

fn default_lookback_days() -> u32 {
    0
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            company_timeout_secs: default_company_timeout_secs(),
            lookback_days: default_lookback_days(),
            dry_run: false,
        }
    }
}

impl PipelineConfig {
    /// One company at a time with a long time budget
    ///
    /// Suitable for rate-limited LLM backends or local models on small hosts.
    pub fn conservative() -> Self {
        Self {
            max_concurrency: 1,
            company_timeout_secs: 900,
            ..Self::default()
        }
    }

    /// Many companies in flight with a short time budget
    ///
    /// Suitable for hosted backends with generous rate limits.
    pub fn aggressive() -> Self {
        Self {
            max_concurrency: 16,
            company_timeout_secs: 120,
            ..Self::default()
        }
    }

    /// First and last day of news considered for `week`
    pub fn news_window(&self, week: WeekKey) -> (NaiveDate, NaiveDate) {
        let from = week.monday() - chrono::Duration::days(i64::from(self.lookback_days));
        (from, week.sunday())
    }

    /// Get the per-company time budget as Duration
    pub fn company_timeout(&self) -> Duration {
        Duration::from_secs(self.company_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be at least 1".to_string());
        }
        if self.company_timeout_secs == 0 {
            return Err("company_timeout_secs must be greater than 0".to_string());
        }
        if self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(format!("lookback_days must be at most {}", MAX_LOOKBACK_DAYS));
        }
        Ok(())
    }
}
