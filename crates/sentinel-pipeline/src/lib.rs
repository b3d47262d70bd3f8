//! Sentinel Pipeline
//!
//! Weekly run orchestration, week-over-week comparison and report assembly.
//!
//! # Overview
//!
//! A run is responsible for:
//! - **Processing**: fetch, normalize, extract and dedupe every portfolio
//!   company, several at a time, each within its own time budget
//! - **Reconciliation**: matching this week's incidents with last week's so
//!   continuing incidents keep their ids
//! - **Comparison**: per-company deltas against the most recent prior state
//! - **Reporting**: a deterministic portfolio report with an error section
//! - **Persistence**: exactly one save of the new weekly state
//!
//! # Failure Handling
//!
//! | Failure | Company status | In weekly state | Run result |
//! |---------|----------------|-----------------|------------|
//! | News source down | `FetchFailed` | no | continues |
//! | Classifier error | `AnalysisFailed` | no | continues |
//! | Time budget exceeded | `AnalysisFailed` | no | continues |
//! | Malformed article or incident | unchanged | yes | continues |
//! | State load or save fails | n/a | n/a | `PipelineError::Storage` |
//!
//! # Usage
//!
//! ## Comparing Two Stored Weeks
//!
//! ```
//! use chrono::Utc;
//! use sentinel_domain::{CompanySnapshot, WeekKey, WeeklyState};
//! use sentinel_pipeline::compare;
//!
//! let last: WeekKey = "2024-W16".parse().unwrap();
//! let this: WeekKey = "2024-W17".parse().unwrap();
//!
//! let mut previous = WeeklyState::new(last, Utc::now());
//! previous.insert(CompanySnapshot::new("Acme", last, Vec::new()));
//! let mut current = WeeklyState::new(this, Utc::now());
//! current.insert(CompanySnapshot::new("Acme", this, Vec::new()));
//!
//! let deltas = compare(&current, Some(&previous));
//! assert_eq!(deltas["Acme"].count_delta, 0);
//! ```
//!
//! ## Configuration Presets
//!
//! ```
//! use sentinel_pipeline::PipelineConfig;
//!
//! // Default: 4 companies in flight, 5 minutes each
//! let config = PipelineConfig::default();
//!
//! // Conservative: one company at a time for rate-limited backends
//! let config = PipelineConfig::conservative();
//!
//! // Aggressive: wide fan-out for hosted backends
//! let config = PipelineConfig::aggressive();
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [pipeline]
//! max_concurrency = 4
//! company_timeout_secs = 300
//! lookback_days = 0
//! dry_run = false
//! ```

#![warn(missing_docs)]

pub mod compare;
mod config;
mod error;
mod metrics;
mod pipeline;
pub mod report;


pub use compare::{compare, compare_snapshots};
pub use config::{PipelineConfig, MAX_LOOKBACK_DAYS};
pub use error::PipelineError;
pub use metrics::RunMetrics;
pub use pipeline::{Pipeline, RunOutcome};
pub use report::{assemble, report_order};
