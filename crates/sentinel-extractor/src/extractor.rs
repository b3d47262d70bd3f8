//! Core Extractor implementation

use crate::batching::CandidateBatcher;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::types::{ExtractionFailure, ExtractionMetadata, ExtractionOutcome};
use sentinel_domain::incident::{MAX_SEVERITY, MIN_SEVERITY};
use sentinel_domain::traits::Classifier;
use sentinel_domain::{
    ArticleCandidate, Category, Company, Incident, IncidentDescriptor, IncidentId, IncidentStatus,
};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// The Extractor turns article candidates into validated incidents
///
/// Grouping and scoring are delegated to a [`Classifier`]; everything the
/// classifier returns is validated and pinned here before it becomes an
/// [`Incident`].
pub struct Extractor<C: Classifier> {
    classifier: C,
    config: ExtractorConfig,
}

impl<C: Classifier> Extractor<C> {
    /// Create a new Extractor
    pub fn new(classifier: C, config: ExtractorConfig) -> Self {
        Self { classifier, config }
    }

    /// The active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract incidents for `company` from its normalized candidates
    ///
    /// Any classify failure or timeout fails the whole extraction for this
    /// company; invalid descriptors are collected, not fatal.
    pub async fn extract(
        &self,
        company: &Company,
        candidates: Vec<ArticleCandidate>,
    ) -> Result<ExtractionOutcome, ExtractorError> {
        let start_time = Instant::now();
        let mut outcome = ExtractionOutcome {
            metadata: ExtractionMetadata {
                company_ref: company.company_ref().to_string(),
                candidates: candidates.len(),
                ..ExtractionMetadata::default()
            },
            ..ExtractionOutcome::default()
        };

        if candidates.is_empty() {
            debug!(company = %company.name, "No candidates, skipping classification");
            return Ok(outcome);
        }

        let batches = CandidateBatcher::new(self.config.max_candidates_per_call).batch(candidates);
        info!(company = %company.name, batches = batches.len(), "Starting extraction");

        for (idx, batch) in batches.iter().enumerate() {
            debug!("Processing batch {}/{} ({} candidates)", idx + 1, batches.len(), batch.len());

            let descriptors = timeout(
                self.config.extraction_timeout(),
                self.classifier.classify(company, batch),
            )
            .await
            .map_err(|_| ExtractorError::Timeout)?
            .map_err(|e| ExtractorError::Classification(e.to_string()))?;

            outcome.metadata.batches += 1;
            outcome.metadata.descriptors_received += descriptors.len();

            for descriptor in descriptors {
                let title = descriptor.title.clone();
                match self.build_incident(company, batch, descriptor) {
                    Ok(incident) if incident.confidence < self.config.confidence_threshold => {
                        debug!(
                            title = %incident.title,
                            confidence = incident.confidence,
                            "Discarding low-confidence incident"
                        );
                        outcome.discarded_low_confidence += 1;
                    }
                    Ok(incident) => outcome.incidents.push(incident),
                    Err(reason) => {
                        warn!(company = %company.name, %title, %reason, "Invalid incident descriptor");
                        outcome.invalid.push(ExtractionFailure { reason, title });
                    }
                }
            }
        }

        outcome.metadata.processing_time_ms = start_time.elapsed().as_millis() as u64;

        info!(
            company = %company.name,
            incidents = outcome.incidents.len(),
            discarded = outcome.discarded_low_confidence,
            invalid = outcome.invalid.len(),
            "Extraction complete"
        );

        Ok(outcome)
    }

    /// Validate a descriptor against its batch and build the incident
    fn build_incident(
        &self,
        company: &Company,
        batch: &[ArticleCandidate],
        descriptor: IncidentDescriptor,
    ) -> Result<Incident, String> {
        let title = descriptor.title.trim();
        if title.is_empty() {
            return Err("missing title".to_string());
        }

        let severity = descriptor
            .severity
            .ok_or_else(|| "missing or non-numeric severity".to_string())?
            .clamp(MIN_SEVERITY as i64, MAX_SEVERITY as i64) as u8;

        let confidence = descriptor
            .confidence
            .and_then(normalize_confidence)
            .ok_or_else(|| "missing or non-numeric confidence".to_string())?;

        let evidence = resolve_evidence(batch, &descriptor);
        let first_seen_date = evidence
            .values()
            .map(|c| c.published_date)
            .min()
            .ok_or_else(|| "no evidence among this batch's articles".to_string())?;

        let evidence_urls: BTreeSet<String> = evidence.keys().map(|url| url.to_string()).collect();
        let languages: BTreeSet<String> = evidence.values().map(|c| c.language.clone()).collect();

        let summary = truncate_sentences(&descriptor.summary_en, self.config.max_summary_sentences);
        let summary_en = if summary.is_empty() { title.to_string() } else { summary };

        let key_quote = descriptor.key_quote.trim();
        let key_quotes = if key_quote.is_empty() { Vec::new() } else { vec![key_quote.to_string()] };

        let company_ref = company.company_ref();
        Ok(Incident {
            incident_id: IncidentId::compute(company_ref, evidence_urls.iter().map(String::as_str)),
            company_ref: company_ref.to_string(),
            title: title.to_string(),
            category: Category::from_label(&descriptor.category),
            severity,
            confidence,
            summary_en,
            key_quotes,
            evidence_urls,
            first_seen_date,
            languages,
            status: IncidentStatus::New,
        })
    }
}

/// Map the descriptor's indices and URLs onto the batch's candidates
///
/// Out-of-range indices and URLs not present in the batch are ignored.
fn resolve_evidence<'a>(
    batch: &'a [ArticleCandidate],
    descriptor: &IncidentDescriptor,
) -> BTreeMap<&'a str, &'a ArticleCandidate> {
    let mut evidence = BTreeMap::new();

    for &idx in &descriptor.article_indices {
        match batch.get(idx) {
            Some(candidate) => {
                evidence.insert(candidate.url.as_str(), candidate);
            }
            None => debug!(idx, batch_len = batch.len(), "Article index out of range"),
        }
    }

    for url in &descriptor.evidence_urls {
        match batch.iter().find(|c| c.url == url.trim()) {
            Some(candidate) => {
                evidence.insert(candidate.url.as_str(), candidate);
            }
            None => debug!(%url, "Evidence URL not in batch"),
        }
    }

    evidence
}

/// Clamp a stated confidence into [0, 1]
///
/// Values in (1, 100] are read as percentages. Non-finite values are rejected.
pub fn normalize_confidence(raw: f64) -> Option<f64> {
    if !raw.is_finite() {
        return None;
    }
    let value = if raw > 1.0 && raw <= 100.0 { raw / 100.0 } else { raw };
    Some(value.clamp(0.0, 1.0))
}

/// Keep at most `max_sentences` sentences of `text`
pub fn truncate_sentences(text: &str, max_sentences: usize) -> String {
    if max_sentences == 0 {
        return String::new();
    }
    let text = text.trim();
    let mut count = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
            if at_boundary {
                count += 1;
                if count == max_sentences {
                    return text[..i + c.len_utf8()].to_string();
                }
            }
        }
    }

    text.to_string()
}
