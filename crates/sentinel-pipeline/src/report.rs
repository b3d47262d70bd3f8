//! Portfolio report assembly
//!
//! Structural composition only: snapshots and deltas are attached to their
//! company rows, rows are put in report order, and portfolio totals are
//! summed. No analysis happens here.

use sentinel_domain::{
    CompanyReport, PortfolioReport, PortfolioSummary, RunError, Trend, TrendDelta, WeeklyState,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;

const INITIAL_RUN_NOTE: &str = "Initial run, no trend data available.";

/// Build the portfolio report for a run
///
/// Rows without a delta pick theirs up from `deltas`. The row order and the
/// error section order depend only on their contents.
pub fn assemble(
    run_id: impl Into<String>,
    current: &WeeklyState,
    previous: Option<&WeeklyState>,
    deltas: &BTreeMap<String, TrendDelta>,
    mut companies: Vec<CompanyReport>,
    mut errors: Vec<RunError>,
) -> PortfolioReport {
    for row in &mut companies {
        if row.delta.is_none() && row.status.has_snapshot() {
            row.delta = deltas.get(&row.company_ref).cloned();
        }
    }
    companies.sort_by(report_order);
    errors.sort_by(|a, b| {
        a.company_ref
            .cmp(&b.company_ref)
            .then(a.kind.cmp(&b.kind))
            .then_with(|| a.message.cmp(&b.message))
    });

    let summary = summarize(current, previous, &companies);

    PortfolioReport {
        run_id: run_id.into(),
        week_key: current.week_key,
        week_ending: current.week_key.sunday(),
        generated_at: current.generated_at,
        baseline_week: previous.map(|p| p.week_key),
        summary,
        companies,
        errors,
    }
}

/// Max severity desc, then count delta desc, then name asc
pub fn report_order(a: &CompanyReport, b: &CompanyReport) -> Ordering {
    b.max_severity()
        .cmp(&a.max_severity())
        .then(b.count_delta().cmp(&a.count_delta()))
        .then_with(|| a.company_ref.cmp(&b.company_ref))
}

fn summarize(
    current: &WeeklyState,
    previous: Option<&WeeklyState>,
    companies: &[CompanyReport],
) -> PortfolioSummary {
    let metrics = current.portfolio_metrics();
    let companies_with_errors = companies.iter().filter(|c| c.status.is_error()).count();

    let (total_incidents_delta, avg_severity_delta, trend, mut notes) = match previous {
        Some(previous) => {
            let prior = previous.portfolio_metrics();
            let total_delta = metrics.incident_count as i64 - prior.incident_count as i64;
            (
                Some(total_delta),
                Some(metrics.avg_severity - prior.avg_severity),
                Trend::from_count_delta(total_delta),
                format!("Week-over-week comparison against {}.", previous.week_key),
            )
        }
        None => (None, None, Trend::Stable, INITIAL_RUN_NOTE.to_string()),
    };

    if companies_with_errors > 0 {
        notes.push_str(&format!(
            " {} of {} companies could not be analyzed.",
            companies_with_errors,
            companies.len()
        ));
    }

    PortfolioSummary {
        total_incidents: metrics.incident_count,
        avg_severity: metrics.avg_severity,
        count_sev_4_5: metrics.count_sev_4_5,
        by_category: metrics.by_category,
        total_incidents_delta,
        avg_severity_delta,
        trend,
        companies_with_errors,
        notes,
    }
}
