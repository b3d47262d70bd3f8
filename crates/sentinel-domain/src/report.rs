//! Portfolio report structure consumed by renderers

use crate::incident::Category;
use crate::snapshot::CompanySnapshot;
use crate::trend::{Trend, TrendDelta};
use crate::week::WeekKey;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of processing one company in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompanyStatus {
    /// Articles were fetched and analyzed
    Analyzed,
    /// The source returned no usable articles this week
    NoData,
    /// The news source failed; no data this week
    FetchFailed,
    /// Classification failed or timed out; excluded from this week's counts
    AnalysisFailed,
}

impl CompanyStatus {
    /// Whether the company has a snapshot in this week's state
    pub fn has_snapshot(&self) -> bool {
        matches!(self, CompanyStatus::Analyzed | CompanyStatus::NoData)
    }

    /// Whether the company should carry an error flag in the report
    pub fn is_error(&self) -> bool {
        matches!(self, CompanyStatus::FetchFailed | CompanyStatus::AnalysisFailed)
    }
}

impl fmt::Display for CompanyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CompanyStatus::Analyzed => "analyzed",
            CompanyStatus::NoData => "no data this week",
            CompanyStatus::FetchFailed => "fetch failed",
            CompanyStatus::AnalysisFailed => "analysis failed",
        };
        f.write_str(label)
    }
}

/// Error taxonomy for the run-level error section
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FailureKind {
    /// News source unreachable or failing
    Fetch,
    /// Classifier failure or unparseable output
    Classification,
    /// Per-company processing exceeded its time budget
    Timeout,
    /// Malformed record or descriptor dropped at the smallest scope
    Validation,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Fetch => "fetch",
            FailureKind::Classification => "classification",
            FailureKind::Timeout => "timeout",
            FailureKind::Validation => "validation",
        };
        f.write_str(label)
    }
}

/// One entry in the report's error section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    /// Company the error belongs to
    pub company_ref: String,

    /// Error category
    pub kind: FailureKind,

    /// Human-readable detail
    pub message: String,
}

/// One company's row in the portfolio report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyReport {
    /// Company key
    pub company_ref: String,

    /// Exchange ticker
    pub ticker: String,

    /// Processing outcome
    pub status: CompanyStatus,

    /// This week's snapshot, absent when processing failed
    pub snapshot: Option<CompanySnapshot>,

    /// Week-over-week delta, absent when processing failed
    pub delta: Option<TrendDelta>,

    /// Raw articles dropped by the normalizer
    pub dropped_articles: usize,

    /// Incidents dropped for low confidence or invalid shape
    pub discarded_incidents: usize,

    /// Error detail when `status` is a failure
    pub error: Option<String>,
}

impl CompanyReport {
    /// Current max severity, 0 without a snapshot
    pub fn max_severity(&self) -> u8 {
        self.snapshot.as_ref().map_or(0, |s| s.metrics.max_severity)
    }

    /// Count delta, 0 without a delta
    pub fn count_delta(&self) -> i64 {
        self.delta.as_ref().map_or(0, |d| d.count_delta)
    }
}

/// Portfolio-wide aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Incidents across all companies
    pub total_incidents: usize,

    /// Mean severity across all incidents
    pub avg_severity: f64,

    /// Incidents with severity 4 or 5
    pub count_sev_4_5: usize,

    /// Incidents per category
    pub by_category: BTreeMap<Category, usize>,

    /// Change in total incidents, absent on an initial run
    pub total_incidents_delta: Option<i64>,

    /// Change in average severity, absent on an initial run
    pub avg_severity_delta: Option<f64>,

    /// Direction of the total incident count
    pub trend: Trend,

    /// Companies flagged with errors this run
    pub companies_with_errors: usize,

    /// Free-text note for renderers
    pub notes: String,
}

/// The per-run report handed to renderers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    /// Run identifier
    pub run_id: String,

    /// Week reported on
    pub week_key: WeekKey,

    /// Last day of the reported week
    pub week_ending: NaiveDate,

    /// When the report was produced
    pub generated_at: DateTime<Utc>,

    /// Week the comparison baseline came from, if any
    pub baseline_week: Option<WeekKey>,

    /// Portfolio-wide aggregates
    pub summary: PortfolioSummary,

    /// Companies in report order
    pub companies: Vec<CompanyReport>,

    /// Every error recorded during the run
    pub errors: Vec<RunError>,
}
