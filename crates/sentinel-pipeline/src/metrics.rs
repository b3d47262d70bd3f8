//! Metrics collected during a pipeline run

use sentinel_domain::{CompanyStatus, FailureKind};
use std::collections::BTreeMap;

/// Counters collected while processing one week
///
/// Tracks per-company outcomes, article and incident volumes, and failures by
/// kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunMetrics {
    /// Companies analyzed successfully
    pub analyzed: usize,

    /// Companies with no usable articles
    pub no_data: usize,

    /// Companies whose news fetch failed
    pub fetch_failed: usize,

    /// Companies whose classification failed or timed out
    pub analysis_failed: usize,

    /// Raw articles returned by the news source
    pub articles_fetched: usize,

    /// Raw articles dropped during normalization
    pub articles_dropped: usize,

    /// Incidents kept after dedupe
    pub incidents: usize,

    /// Incidents discarded for low confidence or invalid shape
    pub discarded_incidents: usize,

    /// Errors recorded per kind
    pub failures: BTreeMap<FailureKind, usize>,

    /// Wall-clock time of the run in milliseconds
    pub total_runtime_ms: u64,
}

impl RunMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a company's final status
    pub fn record_company(&mut self, status: CompanyStatus) {
        match status {
            CompanyStatus::Analyzed => self.analyzed += 1,
            CompanyStatus::NoData => self.no_data += 1,
            CompanyStatus::FetchFailed => self.fetch_failed += 1,
            CompanyStatus::AnalysisFailed => self.analysis_failed += 1,
        }
    }

    /// Record a recorded error
    pub fn record_failure(&mut self, kind: FailureKind) {
        *self.failures.entry(kind).or_insert(0) += 1;
    }

    /// Companies processed, whatever the outcome
    pub fn total_companies(&self) -> usize {
        self.analyzed + self.no_data + self.fetch_failed + self.analysis_failed
    }

    /// Errors recorded across all kinds
    pub fn total_failures(&self) -> usize {
        self.failures.values().sum()
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Run Metrics Summary".to_string(),
            "===================".to_string(),
            format!(
                "Companies: {} ({} analyzed, {} no data, {} fetch failed, {} analysis failed)",
                self.total_companies(),
                self.analyzed,
                self.no_data,
                self.fetch_failed,
                self.analysis_failed
            ),
            format!(
                "Articles: {} fetched, {} dropped",
                self.articles_fetched, self.articles_dropped
            ),
            format!(
                "Incidents: {} kept, {} discarded",
                self.incidents, self.discarded_incidents
            ),
            format!("Runtime: {}ms", self.total_runtime_ms),
        ];

        if !self.failures.is_empty() {
            lines.push(String::new());
            lines.push("Errors by kind:".to_string());
            for (kind, count) in &self.failures {
                lines.push(format!("  {}: {}", kind, count));
            }
            lines.push(format!("  Total: {}", self.total_failures()));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_empty() {
        let metrics = RunMetrics::new();
        assert_eq!(metrics.total_companies(), 0);
        assert_eq!(metrics.total_failures(), 0);
    }

    #[test]
    fn test_record_company() {
        let mut metrics = RunMetrics::new();
        metrics.record_company(CompanyStatus::Analyzed);
        metrics.record_company(CompanyStatus::Analyzed);
        metrics.record_company(CompanyStatus::NoData);
        metrics.record_company(CompanyStatus::AnalysisFailed);

        assert_eq!(metrics.analyzed, 2);
        assert_eq!(metrics.no_data, 1);
        assert_eq!(metrics.analysis_failed, 1);
        assert_eq!(metrics.total_companies(), 4);
    }

    #[test]
    fn test_record_failure() {
        let mut metrics = RunMetrics::new();
        metrics.record_failure(FailureKind::Validation);
        metrics.record_failure(FailureKind::Validation);
        metrics.record_failure(FailureKind::Timeout);

        assert_eq!(metrics.failures.get(&FailureKind::Validation), Some(&2));
        assert_eq!(metrics.total_failures(), 3);
    }

    #[test]
    fn test_summary_format() {
        let mut metrics = RunMetrics::new();
        metrics.record_company(CompanyStatus::FetchFailed);
        metrics.record_failure(FailureKind::Fetch);
        metrics.articles_fetched = 12;

        let summary = metrics.summary();
        assert!(summary.contains("Run Metrics Summary"));
        assert!(summary.contains("1 fetch failed"));
        assert!(summary.contains("12 fetched"));
        assert!(summary.contains("fetch: 1"));
    }

    #[test]
    fn test_summary_omits_empty_failures() {
        let summary = RunMetrics::new().summary();
        assert!(!summary.contains("Errors by kind"));
    }
}
