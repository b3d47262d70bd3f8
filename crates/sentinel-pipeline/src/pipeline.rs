//! Weekly pipeline runner
//!
//! Loads the prior week once, processes every company concurrently with an
//! independent time budget, then compares, assembles and saves once.

use crate::compare::compare;
use crate::report::assemble;
use crate::{PipelineConfig, PipelineError, RunMetrics};
use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use sentinel_domain::traits::{Classifier, NewsSource, StateStore};
use sentinel_domain::{
    Company, CompanyReport, CompanySnapshot, CompanyStatus, FailureKind, PortfolioReport,
    RawArticle, RunError, TrendDelta, WeekKey, WeeklyState,
};
use sentinel_extractor::{normalize, Deduplicator, Extractor, ExtractorError};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Run identifier (UUIDv7)
    pub run_id: String,

    /// The state written for this week
    pub state: WeeklyState,

    /// Week-over-week deltas per company
    pub deltas: BTreeMap<String, TrendDelta>,

    /// Report for renderers
    pub report: PortfolioReport,

    /// Run counters
    pub metrics: RunMetrics,

    /// Whether the state was persisted (false on dry runs)
    pub saved: bool,
}

/// Per-company result, before it becomes a report row
struct CompanyResult {
    status: CompanyStatus,
    snapshot: Option<CompanySnapshot>,
    articles_fetched: usize,
    dropped_articles: usize,
    discarded_incidents: usize,
    errors: Vec<RunError>,
    error: Option<String>,
}

impl CompanyResult {
    /// A failure; errors recorded before it are attached by the caller
    fn failed(status: CompanyStatus, error: RunError) -> Self {
        Self {
            status,
            snapshot: None,
            articles_fetched: 0,
            dropped_articles: 0,
            discarded_incidents: 0,
            error: Some(error.message.clone()),
            errors: vec![error],
        }
    }
}

/// Weekly pipeline over a news source, a classifier and a state store
///
/// # Examples
///
/// ```no_run
/// use sentinel_domain::{Company, WeekKey};
/// use sentinel_extractor::{Extractor, ExtractorConfig, KeywordClassifier};
/// use sentinel_pipeline::{Pipeline, PipelineConfig};
/// # use sentinel_domain::traits::NewsSource;
/// # async fn example<N: NewsSource>(source: N) -> Result<(), Box<dyn std::error::Error>> {
/// let store = sentinel_store::FileStateStore::new("state")?;
/// let extractor = Extractor::new(KeywordClassifier::new(), ExtractorConfig::default());
/// let mut pipeline = Pipeline::new(extractor, source, store, PipelineConfig::default())?;
///
/// let week: WeekKey = "2024-W17".parse()?;
/// let outcome = pipeline.run(week, &[Company::new("Acme", "ACME")]).await?;
/// println!("{}", outcome.metrics.summary());
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<C, N, S>
where
    C: Classifier,
    N: NewsSource,
    S: StateStore,
{
    extractor: Extractor<C>,
    deduplicator: Deduplicator,
    source: N,
    store: S,
    config: PipelineConfig,
}

impl<C, N, S> Pipeline<C, N, S>
where
    C: Classifier,
    N: NewsSource,
    S: StateStore,
{
    /// Create a new Pipeline, validating its configuration
    pub fn new(extractor: Extractor<C>, source: N, store: S, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;
        extractor.config().validate().map_err(PipelineError::Config)?;

        let deduplicator = Deduplicator::new(extractor.config());
        Ok(Self {
            extractor,
            deduplicator,
            source,
            store,
            config,
        })
    }

    /// The active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The underlying state store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the pipeline and return its state store
    pub fn into_store(self) -> S {
        self.store
    }

    /// Run the pipeline for `week` over `companies`
    ///
    /// Per-company failures are recorded in the report. Only storage and
    /// configuration errors fail the run; a failed save is never reported as
    /// success.
    pub async fn run(&mut self, week: WeekKey, companies: &[Company]) -> Result<RunOutcome, PipelineError> {
        let started = Instant::now();
        let run_id = Uuid::now_v7().to_string();
        check_unique_refs(companies)?;

        info!(%run_id, %week, companies = companies.len(), "Starting weekly run");

        let previous = self.store.load_previous(week).map_err(|e| {
            error!(%week, error = %e, "Failed to load previous state");
            PipelineError::Storage(e.to_string())
        })?;
        match &previous {
            Some(p) => info!(baseline = %p.week_key, "Loaded previous state"),
            None => info!("No previous state, this is an initial run"),
        }

        let window = self.config.news_window(week);
        debug!(from = %window.0, until = %window.1, "News window");
        let mut results = self.process_all(week, window, companies, previous.as_ref()).await;
        results.sort_by_key(|(idx, _)| *idx);

        let mut state = WeeklyState::new(week, Utc::now());
        let mut metrics = RunMetrics::new();
        let mut rows = Vec::with_capacity(companies.len());
        let mut errors = Vec::new();

        for ((_, result), company) in results.into_iter().zip(companies) {
            metrics.record_company(result.status);
            metrics.articles_fetched += result.articles_fetched;
            metrics.articles_dropped += result.dropped_articles;
            metrics.discarded_incidents += result.discarded_incidents;
            for e in &result.errors {
                metrics.record_failure(e.kind);
            }

            match &result.snapshot {
                Some(snapshot) => {
                    metrics.incidents += snapshot.incidents.len();
                    state.insert(snapshot.clone());
                }
                None => {
                    let company_ref = company.company_ref();
                    let last_known = previous.as_ref().and_then(|p| p.baseline(company_ref)).cloned();
                    state.mark_failed(company_ref, last_known);
                }
            }

            rows.push(CompanyReport {
                company_ref: company.company_ref().to_string(),
                ticker: company.ticker.clone(),
                status: result.status,
                snapshot: result.snapshot,
                delta: None,
                dropped_articles: result.dropped_articles,
                discarded_incidents: result.discarded_incidents,
                error: result.error,
            });
            errors.extend(result.errors);
        }

        let deltas = compare(&state, previous.as_ref());
        let report = assemble(run_id.clone(), &state, previous.as_ref(), &deltas, rows, errors);

        let saved = if self.config.dry_run {
            info!(%week, "Dry run, state not saved");
            false
        } else {
            self.store.save(&state).map_err(|e| {
                error!(%week, error = %e, "Failed to save weekly state");
                PipelineError::Storage(e.to_string())
            })?;
            true
        };

        metrics.total_runtime_ms = started.elapsed().as_millis() as u64;
        info!(
            %run_id,
            %week,
            incidents = metrics.incidents,
            errors = metrics.total_failures(),
            runtime_ms = metrics.total_runtime_ms,
            "Weekly run complete"
        );

        Ok(RunOutcome {
            run_id,
            state,
            deltas,
            report,
            metrics,
            saved,
        })
    }

    /// Process every company with at most `max_concurrency` in flight
    ///
    /// Results carry their portfolio index; completion order is irrelevant.
    async fn process_all(
        &self,
        week: WeekKey,
        window: (NaiveDate, NaiveDate),
        companies: &[Company],
        previous: Option<&WeeklyState>,
    ) -> Vec<(usize, CompanyResult)> {
        stream::iter(companies.iter().enumerate())
            .map(|(idx, company)| {
                let prior = previous.and_then(|p| p.baseline(company.company_ref()));
                async move { (idx, self.process_with_timeout(company, week, window, prior).await) }
            })
            .buffer_unordered(self.config.max_concurrency)
            .collect()
            .await
    }

    /// Run one company under its time budget
    ///
    /// Errors are collected outside the timed future so those recorded
    /// before a timeout still reach the report.
    async fn process_with_timeout(
        &self,
        company: &Company,
        week: WeekKey,
        window: (NaiveDate, NaiveDate),
        prior: Option<&CompanySnapshot>,
    ) -> CompanyResult {
        let budget = self.config.company_timeout();
        let mut errors = Vec::new();
        let outcome = timeout(budget, self.process_company(company, week, window, prior, &mut errors)).await;

        let mut result = match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!(company = %company.name, ?budget, "Company processing timed out");
                CompanyResult::failed(
                    CompanyStatus::AnalysisFailed,
                    RunError {
                        company_ref: company.company_ref().to_string(),
                        kind: FailureKind::Timeout,
                        message: format!("processing exceeded {}s", budget.as_secs()),
                    },
                )
            }
        };
        errors.append(&mut result.errors);
        result.errors = errors;
        result
    }

    /// Fetch, normalize, extract, dedupe and reconcile one company
    ///
    /// Non-fatal errors go to `errors` as they happen.
    async fn process_company(
        &self,
        company: &Company,
        week: WeekKey,
        window: (NaiveDate, NaiveDate),
        prior: Option<&CompanySnapshot>,
        errors: &mut Vec<RunError>,
    ) -> CompanyResult {
        let company_ref = company.company_ref();
        let (from, until) = window;

        let (raw, fetched_any) = self.fetch_all(company, window, errors).await;
        if !fetched_any {
            let message = format!("news source unavailable for all {} language(s)", company.languages.len());
            return CompanyResult::failed(
                CompanyStatus::FetchFailed,
                RunError {
                    company_ref: company_ref.to_string(),
                    kind: FailureKind::Fetch,
                    message,
                },
            );
        }
        let articles_fetched = raw.len();

        let normalized = normalize(&raw, company_ref);
        for dropped in &normalized.dropped {
            errors.push(RunError {
                company_ref: company_ref.to_string(),
                kind: FailureKind::Validation,
                message: format!("article {} dropped: {}", dropped.index, dropped.reason),
            });
        }

        // Sources are not trusted to honor the window
        let (candidates, outside): (Vec<_>, Vec<_>) = normalized
            .candidates
            .into_iter()
            .partition(|c| c.published_date >= from && c.published_date <= until);
        for candidate in &outside {
            warn!(
                company = %company.name,
                url = %candidate.url,
                date = %candidate.published_date,
                "Article outside the news window"
            );
            errors.push(RunError {
                company_ref: company_ref.to_string(),
                kind: FailureKind::Validation,
                message: format!(
                    "article {} dropped: published {} outside {}..{}",
                    candidate.url, candidate.published_date, from, until
                ),
            });
        }
        let dropped_articles = normalized.dropped.len() + outside.len();

        if candidates.is_empty() {
            info!(company = %company.name, "No usable articles this week");
            return CompanyResult {
                status: CompanyStatus::NoData,
                snapshot: Some(CompanySnapshot::new(company_ref, week, Vec::new())),
                articles_fetched,
                dropped_articles,
                discarded_incidents: 0,
                errors: Vec::new(),
                error: None,
            };
        }

        let outcome = match self.extractor.extract(company, candidates).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(company = %company.name, error = %e, "Extraction failed");
                let kind = if matches!(e, ExtractorError::Timeout) {
                    FailureKind::Timeout
                } else {
                    FailureKind::Classification
                };
                let mut result = CompanyResult::failed(
                    CompanyStatus::AnalysisFailed,
                    RunError {
                        company_ref: company_ref.to_string(),
                        kind,
                        message: e.to_string(),
                    },
                );
                result.articles_fetched = articles_fetched;
                result.dropped_articles = dropped_articles;
                return result;
            }
        };

        for failure in &outcome.invalid {
            errors.push(RunError {
                company_ref: company_ref.to_string(),
                kind: FailureKind::Validation,
                message: format!("incident '{}' dropped: {}", failure.title, failure.reason),
            });
        }
        let discarded_incidents = outcome.discarded_low_confidence + outcome.invalid.len();

        let deduped = self.deduplicator.dedupe(outcome.incidents);
        let reconciled = self.deduplicator.reconcile_with_prior(deduped, prior);
        debug!(company = %company.name, incidents = reconciled.len(), "Incidents finalized");

        CompanyResult {
            status: CompanyStatus::Analyzed,
            snapshot: Some(CompanySnapshot::new(company_ref, week, reconciled)),
            articles_fetched,
            dropped_articles,
            discarded_incidents,
            errors: Vec::new(),
            error: None,
        }
    }

    /// Fetch every configured language; false when all of them failed
    async fn fetch_all(
        &self,
        company: &Company,
        (from, until): (NaiveDate, NaiveDate),
        errors: &mut Vec<RunError>,
    ) -> (Vec<RawArticle>, bool) {
        let languages: BTreeSet<&str> = company.languages.iter().map(String::as_str).collect();
        let mut articles = Vec::new();
        let mut fetched_any = false;

        for language in languages {
            match self.source.fetch(company, language, from, until).await {
                Ok(batch) => {
                    debug!(company = %company.name, language, articles = batch.len(), "Fetched articles");
                    fetched_any = true;
                    articles.extend(batch);
                }
                Err(e) => {
                    warn!(company = %company.name, language, error = %e, "News fetch failed");
                    errors.push(RunError {
                        company_ref: company.company_ref().to_string(),
                        kind: FailureKind::Fetch,
                        message: format!("fetch ({}) failed: {}", language, e),
                    });
                }
            }
        }

        (articles, fetched_any)
    }
}

fn check_unique_refs(companies: &[Company]) -> Result<(), PipelineError> {
    let mut seen = BTreeSet::new();
    for company in companies {
        if !seen.insert(company.company_ref()) {
            return Err(PipelineError::Config(format!(
                "company '{}' appears more than once in the portfolio",
                company.name
            )));
        }
    }
    Ok(())
}
