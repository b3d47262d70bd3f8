//! Result types for normalization and extraction

use sentinel_domain::{ArticleCandidate, Incident};
use serde::{Deserialize, Serialize};

/// Output of [`normalize`](crate::normalize)
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutput {
    /// Valid, URL-deduplicated candidates in input order
    pub candidates: Vec<ArticleCandidate>,

    /// Records that could not be normalized
    pub dropped: Vec<DroppedRecord>,
}

/// A raw record rejected by the normalizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedRecord {
    /// Position of the record in the raw input
    pub index: usize,

    /// Why it was dropped
    pub reason: String,

    /// The URL, when one was present
    pub url: Option<String>,
}

/// Result of extracting incidents for one company
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    /// Validated incidents at or above the confidence threshold
    pub incidents: Vec<Incident>,

    /// Number of incidents dropped by the confidence filter
    pub discarded_low_confidence: usize,

    /// Classifier descriptors that failed validation
    pub invalid: Vec<ExtractionFailure>,

    /// Metadata about the extraction
    pub metadata: ExtractionMetadata,
}

/// Information about a descriptor that could not become an incident
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionFailure {
    /// Reason for failure
    pub reason: String,

    /// Title the classifier gave, possibly empty
    pub title: String,
}

/// Metadata about an extraction
#[derive(Debug, Clone, Default)]
pub struct ExtractionMetadata {
    /// Company the candidates belong to
    pub company_ref: String,

    /// Candidates handed to the classifier
    pub candidates: usize,

    /// Classify calls made
    pub batches: usize,

    /// Descriptors returned across all batches
    pub descriptors_received: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}
