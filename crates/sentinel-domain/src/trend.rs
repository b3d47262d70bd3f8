//! Week-over-week trend deltas

use crate::incident::IncidentId;
use crate::week::WeekKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Direction of a company's incident count compared with last week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Trend {
    /// More incidents than last week
    Worsening,
    /// Same number of incidents
    #[default]
    Stable,
    /// Fewer incidents than last week
    Improving,
}

impl Trend {
    /// Classify a count delta
    pub fn from_count_delta(count_delta: i64) -> Self {
        match count_delta {
            d if d > 0 => Trend::Worsening,
            d if d < 0 => Trend::Improving,
            _ => Trend::Stable,
        }
    }

    /// Arrow used in tables
    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Worsening => "↑",
            Trend::Stable => "→",
            Trend::Improving => "↓",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Worsening => "Worsening",
            Trend::Stable => "Stable",
            Trend::Improving => "Improving",
        };
        f.write_str(label)
    }
}

/// Week-over-week change for one company
///
/// Derived from two weekly states on every run; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendDelta {
    /// Company key
    pub company_ref: String,

    /// Incidents present this week but not last week
    pub new_incident_ids: BTreeSet<IncidentId>,

    /// Incidents present last week but not this week
    pub resolved_incident_ids: BTreeSet<IncidentId>,

    /// Current max severity minus previous max severity
    pub severity_delta: i32,

    /// Current incident count minus previous incident count
    pub count_delta: i64,

    /// Current average severity minus previous average severity
    pub avg_severity_delta: f64,

    /// Direction derived from `count_delta`
    pub trend: Trend,

    /// Week the baseline snapshot came from, `None` without history
    ///
    /// Older than the previous week when the company could not be analyzed
    /// in between.
    #[serde(default)]
    pub baseline_week: Option<WeekKey>,
}
