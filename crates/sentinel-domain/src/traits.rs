//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and its
//! collaborators. Infrastructure implementations live in other crates.

use crate::{ArticleCandidate, Company, IncidentDescriptor, RawArticle, WeekKey, WeeklyState};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Trait for persisting weekly state
///
/// Implemented by the infrastructure layer (sentinel-store)
pub trait StateStore {
    /// Error type for store operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the state with the largest week key strictly less than `before`
    ///
    /// Returns `Ok(None)` when there is no earlier state; an empty history is
    /// a valid baseline, not an error.
    fn load_previous(&self, before: WeekKey) -> Result<Option<WeeklyState>, Self::Error>;

    /// Load the state for exactly `week`
    fn load(&self, week: WeekKey) -> Result<Option<WeeklyState>, Self::Error>;

    /// Persist a state atomically, replacing only the same week's state
    fn save(&mut self, state: &WeeklyState) -> Result<(), Self::Error>;

    /// All stored weeks, ascending
    fn list_weeks(&self) -> Result<Vec<WeekKey>, Self::Error>;
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (sentinel-llm)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for LLM operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Generate text completion
    async fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Name of the backing model, for logs and reports
    fn model_name(&self) -> &str;
}

/// Trait for grouping article candidates into incident descriptors
///
/// Implemented by the application layer (sentinel-extractor)
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Error type for classification
    type Error: std::error::Error + Send + Sync + 'static;

    /// Group `candidates` into distinct real-world incidents for `company`
    ///
    /// Article indices in the returned descriptors refer to positions in
    /// `candidates`.
    async fn classify(
        &self,
        company: &Company,
        candidates: &[ArticleCandidate],
    ) -> Result<Vec<IncidentDescriptor>, Self::Error>;
}

/// Trait for fetching raw news articles
///
/// Results may be empty, duplicated or irrelevant; callers never trust them
/// beyond their shape.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Error type for fetch operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch articles about `company` in `language` published within
    /// `from..=until`
    async fn fetch(
        &self,
        company: &Company,
        language: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<RawArticle>, Self::Error>;
}
