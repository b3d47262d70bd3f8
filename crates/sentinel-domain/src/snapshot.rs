//! Per-company and per-week snapshots

use crate::incident::{Category, Incident, IncidentId};
use crate::week::WeekKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Aggregate metrics over one company's incidents for one week
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SnapshotMetrics {
    /// Number of incidents
    pub incident_count: usize,

    /// Highest severity, 0 when there are no incidents
    pub max_severity: u8,

    /// Mean severity, 0.0 when there are no incidents
    pub avg_severity: f64,

    /// Incidents with severity 4 or 5
    pub count_sev_4_5: usize,

    /// Incident count per category
    pub by_category: BTreeMap<Category, usize>,
}

impl SnapshotMetrics {
    /// Compute metrics over a set of incidents
    pub fn from_incidents(incidents: &[Incident]) -> Self {
        let incident_count = incidents.len();
        let max_severity = incidents.iter().map(|i| i.severity).max().unwrap_or(0);
        let avg_severity = if incident_count > 0 {
            incidents.iter().map(|i| f64::from(i.severity)).sum::<f64>() / incident_count as f64
        } else {
            0.0
        };
        let count_sev_4_5 = incidents.iter().filter(|i| i.is_major()).count();

        let mut by_category = BTreeMap::new();
        for incident in incidents {
            *by_category.entry(incident.category).or_insert(0) += 1;
        }

        Self {
            incident_count,
            max_severity,
            avg_severity,
            count_sev_4_5,
            by_category,
        }
    }
}

/// One company's finalized incidents for one week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySnapshot {
    /// Company key
    pub company_ref: String,

    /// Week this snapshot belongs to
    pub week_key: WeekKey,

    /// Incidents, ordered by severity (desc), first seen date, then id
    pub incidents: Vec<Incident>,

    /// Metrics over `incidents`
    pub metrics: SnapshotMetrics,
}

impl CompanySnapshot {
    /// Finalize a company's incidents into a snapshot
    ///
    /// Incidents are put into canonical order and metrics are computed, so two
    /// snapshots built from the same set are identical.
    pub fn new(company_ref: impl Into<String>, week_key: WeekKey, mut incidents: Vec<Incident>) -> Self {
        incidents.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(a.first_seen_date.cmp(&b.first_seen_date))
                .then_with(|| a.incident_id.cmp(&b.incident_id))
        });
        let metrics = SnapshotMetrics::from_incidents(&incidents);

        Self {
            company_ref: company_ref.into(),
            week_key,
            incidents,
            metrics,
        }
    }

    /// Ids of all incidents in this snapshot
    pub fn incident_ids(&self) -> BTreeSet<&IncidentId> {
        self.incidents.iter().map(|i| &i.incident_id).collect()
    }
}

/// The persisted result of one weekly run
///
/// Written once per run and never mutated afterwards; each run creates a new
/// state and reads at most the single most recent prior one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyState {
    /// ISO week this state describes
    pub week_key: WeekKey,

    /// When the run produced this state
    pub generated_at: DateTime<Utc>,

    /// Snapshot per company
    pub snapshots: BTreeMap<String, CompanySnapshot>,

    /// Companies that could not be analyzed, with their last known snapshot
    ///
    /// The carried snapshot keeps its original week key. It is the baseline
    /// the next run compares and reconciles against.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failed: BTreeMap<String, Option<CompanySnapshot>>,
}

impl WeeklyState {
    /// Create an empty state for a week
    pub fn new(week_key: WeekKey, generated_at: DateTime<Utc>) -> Self {
        Self {
            week_key,
            generated_at,
            snapshots: BTreeMap::new(),
            failed: BTreeMap::new(),
        }
    }

    /// Add or replace a company's snapshot
    pub fn insert(&mut self, snapshot: CompanySnapshot) {
        self.snapshots.insert(snapshot.company_ref.clone(), snapshot);
    }

    /// A company's snapshot, if present
    pub fn snapshot(&self, company_ref: &str) -> Option<&CompanySnapshot> {
        self.snapshots.get(company_ref)
    }

    /// Record a company that failed this week, carrying its last known snapshot
    pub fn mark_failed(&mut self, company_ref: impl Into<String>, last_known: Option<CompanySnapshot>) {
        self.failed.insert(company_ref.into(), last_known);
    }

    /// The snapshot a following week should compare `company_ref` against
    ///
    /// This week's snapshot, or the one carried forward when the company
    /// failed. `None` means the company has no history.
    pub fn baseline(&self, company_ref: &str) -> Option<&CompanySnapshot> {
        self.snapshots
            .get(company_ref)
            .or_else(|| self.failed.get(company_ref).and_then(Option::as_ref))
    }

    /// All incidents across the portfolio
    pub fn all_incidents(&self) -> impl Iterator<Item = &Incident> {
        self.snapshots.values().flat_map(|s| s.incidents.iter())
    }

    /// Portfolio-wide metrics
    pub fn portfolio_metrics(&self) -> SnapshotMetrics {
        let incidents: Vec<Incident> = self.all_incidents().cloned().collect();
        SnapshotMetrics::from_incidents(&incidents)
    }
}
