//! Week-over-week trend comparison
//!
//! Pure functions over two weekly states. A company that could not be
//! analyzed last week compares against the snapshot carried forward from its
//! last successful week; only companies without any history compare against
//! zero metrics.

use sentinel_domain::{CompanySnapshot, IncidentId, SnapshotMetrics, Trend, TrendDelta, WeeklyState};
use std::collections::{BTreeMap, BTreeSet};

/// Compute a delta for every company with a snapshot in `current`
///
/// Companies that failed this week have no snapshot and therefore no delta.
pub fn compare(current: &WeeklyState, previous: Option<&WeeklyState>) -> BTreeMap<String, TrendDelta> {
    current
        .snapshots
        .iter()
        .map(|(company_ref, snapshot)| {
            let prior = previous.and_then(|p| p.baseline(company_ref));
            (company_ref.clone(), compare_snapshots(snapshot, prior))
        })
        .collect()
}

/// Delta between one company's current and prior snapshot
pub fn compare_snapshots(current: &CompanySnapshot, previous: Option<&CompanySnapshot>) -> TrendDelta {
    let current_ids: BTreeSet<IncidentId> = current.incident_ids().into_iter().cloned().collect();
    let previous_ids: BTreeSet<IncidentId> = previous
        .map(|p| p.incident_ids().into_iter().cloned().collect())
        .unwrap_or_default();

    let empty = SnapshotMetrics::default();
    let prior_metrics = previous.map_or(&empty, |p| &p.metrics);
    let metrics = &current.metrics;

    let count_delta = metrics.incident_count as i64 - prior_metrics.incident_count as i64;

    TrendDelta {
        company_ref: current.company_ref.clone(),
        new_incident_ids: current_ids.difference(&previous_ids).cloned().collect(),
        resolved_incident_ids: previous_ids.difference(&current_ids).cloned().collect(),
        severity_delta: i32::from(metrics.max_severity) - i32::from(prior_metrics.max_severity),
        count_delta,
        avg_severity_delta: metrics.avg_severity - prior_metrics.avg_severity,
        trend: Trend::from_count_delta(count_delta),
        baseline_week: previous.map(|p| p.week_key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use sentinel_domain::{Category, Incident, IncidentStatus, WeekKey};

    fn incident(id: &str, severity: u8) -> Incident {
        Incident {
            incident_id: IncidentId::from_string(id),
            company_ref: "Acme".to_string(),
            title: format!("Incident {}", id),
            category: Category::Legal,
            severity,
            confidence: 0.9,
            summary_en: String::new(),
            key_quotes: Vec::new(),
            evidence_urls: BTreeSet::new(),
            first_seen_date: NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
            languages: BTreeSet::new(),
            status: IncidentStatus::New,
        }
    }

    fn state(week: &str, companies: &[(&str, Vec<Incident>)]) -> WeeklyState {
        let key: WeekKey = week.parse().unwrap();
        let mut state = WeeklyState::new(key, Utc::now());
        for (name, incidents) in companies {
            state.insert(CompanySnapshot::new(*name, key, incidents.clone()));
        }
        state
    }

    fn ids(items: &[&str]) -> BTreeSet<IncidentId> {
        items.iter().map(|s| IncidentId::from_string(*s)).collect()
    }

    #[test]
    fn test_week_over_week_example() {
        let previous = state("2024-W16", &[("Acme", vec![incident("A", 3), incident("B", 2)])]);
        let current = state("2024-W17", &[("Acme", vec![incident("A", 3), incident("C", 4)])]);

        let deltas = compare(&current, Some(&previous));
        let delta = &deltas["Acme"];

        assert_eq!(delta.new_incident_ids, ids(&["C"]));
        assert_eq!(delta.resolved_incident_ids, ids(&["B"]));
        assert_eq!(delta.severity_delta, 1);
        assert_eq!(delta.count_delta, 0);
        assert_eq!(delta.avg_severity_delta, 1.0);
        assert_eq!(delta.trend, Trend::Stable);
    }

    #[test]
    fn test_empty_baseline_marks_everything_new() {
        let current = state("2024-W17", &[("Acme", vec![incident("A", 3), incident("C", 4)])]);

        let delta = &compare(&current, None)["Acme"];
        assert_eq!(delta.new_incident_ids, ids(&["A", "C"]));
        assert!(delta.resolved_incident_ids.is_empty());
        assert_eq!(delta.count_delta, 2);
        assert_eq!(delta.severity_delta, 4);
        assert_eq!(delta.trend, Trend::Worsening);
    }

    #[test]
    fn test_company_new_to_portfolio_compares_against_zero() {
        let previous = state("2024-W16", &[("Acme", vec![incident("A", 3)])]);
        let current = state(
            "2024-W17",
            &[("Acme", vec![incident("A", 3)]), ("Globex", vec![incident("G", 2)])],
        );

        let deltas = compare(&current, Some(&previous));
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas["Globex"].count_delta, 1);
        assert_eq!(deltas["Globex"].severity_delta, 2);
        assert_eq!(deltas["Acme"].count_delta, 0);
        assert!(deltas["Acme"].new_incident_ids.is_empty());
    }

    #[test]
    fn test_company_failed_last_week_compares_against_carried_snapshot() {
        let w15 = state("2024-W15", &[("Acme", vec![incident("A", 3), incident("B", 2)])]);
        let mut previous = state("2024-W16", &[]);
        previous.mark_failed("Acme", w15.snapshot("Acme").cloned());
        let current = state("2024-W17", &[("Acme", vec![incident("A", 3), incident("C", 4)])]);

        let delta = &compare(&current, Some(&previous))["Acme"];
        assert_eq!(delta.new_incident_ids, ids(&["C"]));
        assert_eq!(delta.resolved_incident_ids, ids(&["B"]));
        assert_eq!(delta.count_delta, 0);
        assert_eq!(delta.trend, Trend::Stable);
        assert_eq!(delta.baseline_week, Some("2024-W15".parse().unwrap()));
    }

    #[test]
    fn test_all_resolved() {
        let previous = state("2024-W16", &[("Acme", vec![incident("A", 5), incident("B", 1)])]);
        let current = state("2024-W17", &[("Acme", Vec::new())]);

        let delta = &compare(&current, Some(&previous))["Acme"];
        assert_eq!(delta.resolved_incident_ids, ids(&["A", "B"]));
        assert_eq!(delta.count_delta, -2);
        assert_eq!(delta.severity_delta, -5);
        assert_eq!(delta.avg_severity_delta, -3.0);
        assert_eq!(delta.trend, Trend::Improving);
    }

    #[test]
    fn test_companies_missing_this_week_get_no_delta() {
        let previous = state("2024-W16", &[("Acme", vec![incident("A", 3)])]);
        let current = state("2024-W17", &[]);
        assert!(compare(&current, Some(&previous)).is_empty());
    }
}
