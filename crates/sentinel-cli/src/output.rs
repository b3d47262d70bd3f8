//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use sentinel_domain::{PortfolioReport, Trend, TrendDelta, WeekKey, WeeklyState};
use std::collections::BTreeMap;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a run's portfolio report.
    pub fn format_report(&self, report: &PortfolioReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Quiet => Ok(report
                .companies
                .iter()
                .map(|c| format!("{}\t{}", c.company_ref, c.status))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => Ok(self.format_report_table(report)),
        }
    }

    fn format_report_table(&self, report: &PortfolioReport) -> String {
        let summary = &report.summary;
        let mut out = Vec::new();

        out.push(format!(
            "Week {} (ending {}), run {}",
            report.week_key, report.week_ending, report.run_id
        ));
        let delta = summary
            .total_incidents_delta
            .map(|d| format!(" ({:+})", d))
            .unwrap_or_default();
        out.push(format!(
            "Incidents: {}{}  Avg severity: {:.2}  Severity 4-5: {}  Trend: {}",
            summary.total_incidents,
            delta,
            summary.avg_severity,
            summary.count_sev_4_5,
            self.trend_label(summary.trend)
        ));
        out.push(summary.notes.clone());

        let mut builder = Builder::default();
        builder.push_record(["Company", "Ticker", "Status", "Incidents", "Max Sev", "Δ Count", "Δ Sev", "Trend"]);
        for company in &report.companies {
            let incidents = company
                .snapshot
                .as_ref()
                .map(|s| s.metrics.incident_count.to_string())
                .unwrap_or_else(|| "-".to_string());
            let (count_delta, severity_delta, trend) = match &company.delta {
                Some(d) => (
                    format!("{:+}", d.count_delta),
                    format!("{:+}", d.severity_delta),
                    self.trend_label(d.trend),
                ),
                None => ("-".to_string(), "-".to_string(), "-".to_string()),
            };
            let status = if company.status.is_error() {
                self.colorize(&company.status.to_string(), "red")
            } else {
                company.status.to_string()
            };
            builder.push_record([
                company.company_ref.clone(),
                company.ticker.clone(),
                status,
                incidents,
                self.severity_label(company.max_severity()),
                count_delta,
                severity_delta,
                trend,
            ]);
        }
        out.push(self.render(builder));

        if !report.errors.is_empty() {
            let mut builder = Builder::default();
            builder.push_record(["Company", "Kind", "Message"]);
            for error in &report.errors {
                builder.push_record([
                    error.company_ref.clone(),
                    error.kind.to_string(),
                    error.message.clone(),
                ]);
            }
            out.push(self.warning(&format!("{} error(s) recorded", report.errors.len())));
            out.push(self.render(builder));
        }

        out.join("\n")
    }

    /// Format the incidents stored for a week.
    pub fn format_state(&self, state: &WeeklyState, company: Option<&str>) -> Result<String> {
        let snapshots: Vec<_> = state
            .snapshots
            .values()
            .filter(|s| company.map_or(true, |c| s.company_ref == c))
            .collect();

        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&snapshots)?),
            OutputFormat::Quiet => Ok(snapshots
                .iter()
                .flat_map(|s| s.incidents.iter().map(|i| i.incident_id.to_string()))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if snapshots.iter().all(|s| s.incidents.is_empty()) {
                    return Ok(self.colorize(&format!("No incidents stored for {}.", state.week_key), "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Company", "ID", "Sev", "Category", "Status", "First Seen", "Languages", "Title"]);
                for snapshot in snapshots {
                    for incident in &snapshot.incidents {
                        let languages: Vec<&str> = incident.languages.iter().map(String::as_str).collect();
                        builder.push_record([
                            snapshot.company_ref.clone(),
                            incident.incident_id.as_str().chars().take(8).collect::<String>(),
                            self.severity_label(incident.severity),
                            incident.category.to_string(),
                            format!("{:?}", incident.status),
                            incident.first_seen_date.to_string(),
                            languages.join(","),
                            incident.title.clone(),
                        ]);
                    }
                }
                Ok(format!("Week {}\n{}", state.week_key, self.render(builder)))
            }
        }
    }

    /// Format week-over-week deltas between two stored weeks.
    pub fn format_deltas(
        &self,
        week: WeekKey,
        baseline: Option<WeekKey>,
        deltas: &BTreeMap<String, TrendDelta>,
    ) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "week_key": week,
                "baseline_week": baseline,
                "deltas": deltas,
            }))?),
            OutputFormat::Quiet => Ok(deltas
                .values()
                .flat_map(|d| d.new_incident_ids.iter().map(|id| id.to_string()))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let header = match baseline {
                    Some(b) => format!("Week {} compared with {}", week, b),
                    None => format!("Week {} (no earlier week stored)", week),
                };
                if deltas.is_empty() {
                    return Ok(format!("{}\n{}", header, self.colorize("No companies to compare.", "yellow")));
                }

                let mut builder = Builder::default();
                builder.push_record([
                    "Company", "Baseline", "New", "Resolved", "Δ Count", "Δ Max Sev", "Δ Avg Sev", "Trend",
                ]);
                for (company, delta) in deltas {
                    builder.push_record([
                        company.clone(),
                        delta.baseline_week.map_or_else(|| "none".to_string(), |w| w.to_string()),
                        delta.new_incident_ids.len().to_string(),
                        delta.resolved_incident_ids.len().to_string(),
                        format!("{:+}", delta.count_delta),
                        format!("{:+}", delta.severity_delta),
                        format!("{:+.2}", delta.avg_severity_delta),
                        self.trend_label(delta.trend),
                    ]);
                }
                Ok(format!("{}\n{}", header, self.render(builder)))
            }
        }
    }

    /// Format the list of stored weeks.
    pub fn format_weeks(&self, weeks: &[WeekKey]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(weeks)?),
            OutputFormat::Quiet | OutputFormat::Table => {
                if weeks.is_empty() && self.format == OutputFormat::Table {
                    return Ok(self.colorize("No weeks stored.", "yellow"));
                }
                Ok(weeks.iter().map(WeekKey::to_string).collect::<Vec<_>>().join("\n"))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn render(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    fn severity_label(&self, severity: u8) -> String {
        let label = severity.to_string();
        match severity {
            4..=5 => self.colorize(&label, "red"),
            3 => self.colorize(&label, "yellow"),
            _ => label,
        }
    }

    fn trend_label(&self, trend: Trend) -> String {
        let label = format!("{} {}", trend.arrow(), trend);
        match trend {
            Trend::Worsening => self.colorize(&label, "red"),
            Trend::Improving => self.colorize(&label, "green"),
            Trend::Stable => label,
        }
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
