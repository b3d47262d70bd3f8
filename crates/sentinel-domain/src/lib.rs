//! Sentinel Domain Layer
//!
//! This crate contains the data model for Sentinel's weekly controversy
//! monitoring pipeline. It defines the value objects every other crate passes
//! around and the trait interfaces for the external capabilities the pipeline
//! consumes (news source, classifier, LLM provider, state store).
//!
//! ## Key Concepts
//!
//! - **ArticleCandidate**: a normalized news article, immutable once produced
//! - **Incident**: a deduplicated, classified real-world event tied to one company
//! - **CompanySnapshot**: one company's finalized incidents for one week
//! - **WeeklyState**: the persisted, immutable snapshot of a whole run
//! - **TrendDelta**: week-over-week change, derived and never stored
//!
//! ## Architecture
//!
//! - Pure data and pure functions only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod article;
pub mod company;
pub mod incident;
pub mod report;
pub mod snapshot;
pub mod traits;
pub mod trend;
pub mod week;

// Re-exports for convenience
pub use article::{ArticleCandidate, RawArticle};
pub use company::Company;
pub use incident::{Category, Incident, IncidentDescriptor, IncidentId, IncidentStatus};
pub use report::{CompanyReport, CompanyStatus, FailureKind, PortfolioReport, PortfolioSummary, RunError};
pub use snapshot::{CompanySnapshot, SnapshotMetrics, WeeklyState};
pub use trend::{Trend, TrendDelta};
pub use week::WeekKey;
