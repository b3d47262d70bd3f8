//! Classifier implementations
//!
//! - [`LlmClassifier`]: prompt + JSON parser over any [`LlmProvider`]
//! - [`KeywordClassifier`]: offline rule-based classifier, no network

use crate::error::ExtractorError;
use crate::parser::parse_llm_response;
use crate::prompt::{is_high_priority, PromptBuilder};
use async_trait::async_trait;
use sentinel_domain::traits::{Classifier, LlmProvider};
use sentinel_domain::{ArticleCandidate, Category, Company, IncidentDescriptor};
use tracing::debug;

/// Classifier that asks an LLM to group and score articles
pub struct LlmClassifier<L: LlmProvider> {
    provider: L,
}

impl<L: LlmProvider> LlmClassifier<L> {
    /// Wrap an LLM provider
    pub fn new(provider: L) -> Self {
        Self { provider }
    }

    /// The underlying provider
    pub fn provider(&self) -> &L {
        &self.provider
    }
}

#[async_trait]
impl<L: LlmProvider> Classifier for LlmClassifier<L> {
    type Error = ExtractorError;

    async fn classify(
        &self,
        company: &Company,
        candidates: &[ArticleCandidate],
    ) -> Result<Vec<IncidentDescriptor>, Self::Error> {
        let prompt = PromptBuilder::new(company, candidates).build();
        debug!(
            company = %company.name,
            model = self.provider.model_name(),
            prompt_len = prompt.len(),
            "Classifying batch"
        );

        let response = self
            .provider
            .generate(&prompt)
            .await
            .map_err(|e| ExtractorError::Classification(e.to_string()))?;

        debug!(response_len = response.len(), "LLM response received");
        parse_llm_response(&response)
    }
}

/// Keywords per category; the first category with a hit wins
const KEYWORD_RULES: &[(Category, &[&str])] = &[
    (
        Category::Legal,
        &["probe", "investigation", "lawsuit", "indictment", "prosecut", "court", "settlement"],
    ),
    (
        Category::Environmental,
        &["spill", "pollution", "emissions", "toxic", "contamination", "deforestation"],
    ),
    (
        Category::Labor,
        &["strike", "layoffs", "union", "forced labor", "child labor", "workplace injury"],
    ),
    (
        Category::Governance,
        &["whistleblower", "data breach", "privacy", "resigns", "ousted", "misconduct"],
    ),
    (
        Category::Financial,
        &["fraud", "accounting", "restatement", "bribery", "money laundering", "embezzlement"],
    ),
];

/// Offline rule-based classifier
///
/// Each article whose title or snippet contains a controversy keyword
/// becomes one descriptor. Severity starts at 3 (2 when only the snippet
/// matches) and is bumped by one for high-priority outlets. The result
/// depends only on each article, never on its position.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    /// Create a keyword classifier
    pub fn new() -> Self {
        Self
    }

    fn classify_one(&self, company: &Company, index: usize, candidate: &ArticleCandidate) -> Option<IncidentDescriptor> {
        let title = candidate.title.to_lowercase();
        let body = candidate.body_snippet.to_lowercase();

        let (category, keyword, in_title) = KEYWORD_RULES.iter().find_map(|(category, keywords)| {
            keywords.iter().find_map(|keyword| {
                if title.contains(keyword) {
                    Some((*category, *keyword, true))
                } else if body.contains(keyword) {
                    Some((*category, *keyword, false))
                } else {
                    None
                }
            })
        })?;

        let base: i64 = if in_title { 3 } else { 2 };
        let severity = if is_high_priority(&candidate.outlet) { base + 1 } else { base };
        let outlet = if candidate.outlet.is_empty() { "an unnamed outlet" } else { candidate.outlet.as_str() };

        Some(IncidentDescriptor {
            title: candidate.title.clone(),
            category: category.as_str().to_string(),
            severity: Some(severity),
            confidence: Some(if in_title { 0.85 } else { 0.5 }),
            summary_en: format!(
                "{} is the subject of reporting on \"{}\", as reported by {}.",
                company.name, keyword, outlet
            ),
            key_quote: candidate.body_snippet.clone(),
            article_indices: vec![index],
            evidence_urls: Vec::new(),
        })
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    type Error = ExtractorError;

    async fn classify(
        &self,
        company: &Company,
        candidates: &[ArticleCandidate],
    ) -> Result<Vec<IncidentDescriptor>, Self::Error> {
        let descriptors: Vec<_> = candidates
            .iter()
            .enumerate()
            .filter_map(|(index, candidate)| self.classify_one(company, index, candidate))
            .collect();
        debug!(company = %company.name, matched = descriptors.len(), "Keyword classification");
        Ok(descriptors)
    }
}
