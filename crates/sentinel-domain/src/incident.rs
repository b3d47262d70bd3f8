//! Incident module - the unit the whole pipeline counts and compares

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;

/// Number of hex characters kept from the SHA-256 digest
const ID_HEX_LEN: usize = 16;

/// Lowest severity on the ordinal scale
pub const MIN_SEVERITY: u8 = 1;

/// Highest severity on the ordinal scale
pub const MAX_SEVERITY: u8 = 5;

/// Deterministic identifier for an incident
///
/// Derived from the company and the sorted evidence URLs, so the same grouped
/// evidence always produces the same id regardless of the order in which the
/// URLs were collected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentId(String);

impl IncidentId {
    /// Compute the id for a company's incident from its evidence URLs
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_domain::IncidentId;
    ///
    /// let a = IncidentId::compute("Acme", ["https://b.example", "https://a.example"]);
    /// let b = IncidentId::compute("Acme", ["https://a.example", "https://b.example"]);
    /// assert_eq!(a, b);
    /// ```
    pub fn compute<'a, I>(company_ref: &str, evidence_urls: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let sorted: BTreeSet<&str> = evidence_urls.into_iter().collect();

        let mut hasher = Sha256::new();
        hasher.update(company_ref.as_bytes());
        for url in sorted {
            // Separator keeps ("ab","c") and ("a","bc") distinct
            hasher.update([0u8]);
            hasher.update(url.as_bytes());
        }
        let digest = hex::encode(hasher.finalize());
        Self(digest[..ID_HEX_LEN].to_string())
    }

    /// A different id derived from this one, for the `attempt`-th collision
    ///
    /// Used when a computed id is already held by another incident, such as
    /// one inherited from an earlier week.
    ///
    /// ```
    /// use sentinel_domain::IncidentId;
    ///
    /// let id = IncidentId::compute("Acme", ["https://a.example"]);
    /// assert_ne!(id.rehash(1), id);
    /// assert_eq!(id.rehash(1), id.rehash(1));
    /// assert_ne!(id.rehash(1), id.rehash(2));
    /// ```
    pub fn rehash(&self, attempt: u32) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        hasher.update([0u8]);
        hasher.update(attempt.to_be_bytes());
        let digest = hex::encode(hasher.finalize());
        Self(digest[..ID_HEX_LEN].to_string())
    }

    /// Wrap an existing id string (storage and tests)
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed set of controversy categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Lawsuits, prosecutions, regulatory investigations
    Legal,
    /// Pollution, emissions, environmental damage
    Environmental,
    /// Workforce, labour rights, workplace safety
    Labor,
    /// Board, executive conduct, ethics, data handling
    Governance,
    /// Fraud, accounting, financial misconduct
    Financial,
    /// Anything the classifier could not place
    Other,
}

impl Category {
    /// All categories, in declaration order
    pub const ALL: [Category; 6] = [
        Category::Legal,
        Category::Environmental,
        Category::Labor,
        Category::Governance,
        Category::Financial,
        Category::Other,
    ];

    /// Pin a free-text label to the closed set
    ///
    /// Exact names match first (case-insensitive). Compound labels such as
    /// `"Governance/Legal"` resolve to their first recognised part, and a few
    /// common synonyms are accepted. Everything else is `Other`.
    ///
    /// ```
    /// use sentinel_domain::Category;
    ///
    /// assert_eq!(Category::from_label("legal"), Category::Legal);
    /// assert_eq!(Category::from_label("Governance/Legal"), Category::Governance);
    /// assert_eq!(Category::from_label("Labour rights"), Category::Labor);
    /// assert_eq!(Category::from_label("vibes"), Category::Other);
    /// ```
    pub fn from_label(label: &str) -> Self {
        let lowered = label.trim().to_lowercase();

        for part in lowered.split(['/', ',', '&', '|']) {
            if let Some(category) = Self::from_exact(part.trim()) {
                return category;
            }
        }

        Self::from_synonym(&lowered).unwrap_or(Category::Other)
    }

    fn from_exact(label: &str) -> Option<Self> {
        match label {
            "legal" => Some(Category::Legal),
            "environmental" => Some(Category::Environmental),
            "labor" | "labour" => Some(Category::Labor),
            "governance" => Some(Category::Governance),
            "financial" => Some(Category::Financial),
            "other" => Some(Category::Other),
            _ => None,
        }
    }

    fn from_synonym(label: &str) -> Option<Self> {
        const SYNONYMS: &[(&str, Category)] = &[
            ("lawsuit", Category::Legal),
            ("court", Category::Legal),
            ("litigation", Category::Legal),
            ("regulat", Category::Legal),
            ("legal", Category::Legal),
            ("environment", Category::Environmental),
            ("pollution", Category::Environmental),
            ("emission", Category::Environmental),
            ("climate", Category::Environmental),
            ("labor", Category::Labor),
            ("labour", Category::Labor),
            ("worker", Category::Labor),
            ("employ", Category::Labor),
            ("union", Category::Labor),
            ("governance", Category::Governance),
            ("board", Category::Governance),
            ("ethic", Category::Governance),
            ("privacy", Category::Governance),
            ("financ", Category::Financial),
            ("fraud", Category::Financial),
            ("accounting", Category::Financial),
            ("brib", Category::Financial),
        ];

        SYNONYMS
            .iter()
            .find(|(needle, _)| label.contains(needle))
            .map(|(_, category)| *category)
    }

    /// Display label
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Legal => "Legal",
            Category::Environmental => "Environmental",
            Category::Labor => "Labor",
            Category::Governance => "Governance",
            Category::Financial => "Financial",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an incident was already known last week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IncidentStatus {
    /// First reported this week
    #[default]
    New,
    /// Matches an incident from the previous snapshot
    Continuing,
}

/// A deduplicated, classified controversy event for one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Deterministic identifier
    pub incident_id: IncidentId,

    /// Company this incident belongs to
    pub company_ref: String,

    /// Short English headline
    pub title: String,

    /// Closed-set category
    pub category: Category,

    /// Ordinal severity, 1 (minor, local coverage) to 5 (material, regulatory)
    pub severity: u8,

    /// Classifier confidence in [0, 1]
    pub confidence: f64,

    /// English summary, at most two sentences
    pub summary_en: String,

    /// Distinct representative quotes, sorted, at most three
    pub key_quotes: Vec<String>,

    /// Evidence URLs
    pub evidence_urls: BTreeSet<String>,

    /// Earliest publication date among the evidence
    pub first_seen_date: NaiveDate,

    /// Languages the evidence was published in
    pub languages: BTreeSet<String>,

    /// New this week or continuing from last week
    #[serde(default)]
    pub status: IncidentStatus,
}

impl Incident {
    /// The representative quote, if any
    pub fn key_quote(&self) -> Option<&str> {
        self.key_quotes.first().map(String::as_str)
    }

    /// Recompute the id from the current evidence set
    pub fn recompute_id(&mut self) {
        self.incident_id = IncidentId::compute(
            &self.company_ref,
            self.evidence_urls.iter().map(String::as_str),
        );
    }

    /// Whether the severity is in the "major" band (4–5)
    pub fn is_major(&self) -> bool {
        self.severity >= 4
    }
}

/// Unvalidated incident description as produced by a classifier
///
/// Values are taken as the classifier stated them; the extractor clamps,
/// maps and validates before anything becomes an [`Incident`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IncidentDescriptor {
    /// Short English headline
    pub title: String,

    /// Free-text category label
    pub category: String,

    /// Severity as stated (may be outside 1–5), `None` when missing
    pub severity: Option<i64>,

    /// Confidence as stated (may be outside [0, 1]), `None` when missing
    pub confidence: Option<f64>,

    /// English summary
    pub summary_en: String,

    /// Representative quote
    pub key_quote: String,

    /// Indices into the candidate slice the classifier was given
    #[serde(default)]
    pub article_indices: Vec<usize>,

    /// Evidence URLs named directly
    #[serde(default)]
    pub evidence_urls: Vec<String>,
}
