//! Sentinel Extractor
//!
//! Turns raw news articles into deduplicated, classified incidents.
//!
//! # Architecture
//!
//! ```text
//! RawArticle → normalize → ArticleCandidate → Extractor(Classifier) → Incident
//!           → Deduplicator::dedupe → Deduplicator::reconcile_with_prior
//! ```
//!
//! # Key Features
//!
//! - **Normalization**: provider field aliases, URL and date validation, URL dedupe
//! - **Classification**: LLM-backed or keyword-based, behind the `Classifier` trait
//! - **Validation**: severity, category and confidence pinned before anything is kept
//! - **Batching**: canonical candidate order, so grouping is input-order independent
//! - **Deduplication**: connected-component merging to a fixpoint
//!
//! # Example Usage
//!
//! ```no_run
//! use sentinel_domain::{Company, RawArticle};
//! use sentinel_extractor::{normalize, Deduplicator, Extractor, ExtractorConfig, KeywordClassifier};
//!
//! # async fn example(raw: Vec<RawArticle>) -> Result<(), Box<dyn std::error::Error>> {
//! let company = Company::new("Acme Corp", "ACME");
//! let config = ExtractorConfig::default();
//!
//! let normalized = normalize(&raw, company.company_ref());
//! let extractor = Extractor::new(KeywordClassifier::new(), config.clone());
//! let outcome = extractor.extract(&company, normalized.candidates).await?;
//!
//! let incidents = Deduplicator::new(&config).dedupe(outcome.incidents);
//! println!("{} incidents, {} discarded", incidents.len(), outcome.discarded_low_confidence);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod batching;
mod classifier;
mod config;
mod dedup;
mod error;
mod extractor;
mod normalize;
mod parser;
mod prompt;
mod types;


pub use batching::{canonical_order, CandidateBatcher};
pub use classifier::{KeywordClassifier, LlmClassifier};
pub use config::ExtractorConfig;
pub use dedup::{normalize_title, title_similarity, Deduplicator};
pub use error::ExtractorError;
pub use extractor::{normalize_confidence, truncate_sentences, Extractor};
pub use normalize::{normalize, parse_date, UNDETERMINED_LANGUAGE};
pub use parser::parse_llm_response;
pub use prompt::{is_high_priority, PromptBuilder, HIGH_PRIORITY_SOURCES};
pub use types::{DroppedRecord, ExtractionFailure, ExtractionMetadata, ExtractionOutcome, NormalizeOutput};
