//! News articles: raw provider records and normalized candidates

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A provider-specific article record, as returned by a news source
///
/// Field names vary between providers, so the common spellings are accepted
/// as aliases. Every field is optional here; the normalizer decides what is
/// usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    /// Headline
    #[serde(default, alias = "headline")]
    pub title: Option<String>,

    /// Body text or snippet
    #[serde(default, alias = "snippet", alias = "description", alias = "content")]
    pub body: Option<String>,

    /// Article URL
    #[serde(default, alias = "link")]
    pub url: Option<String>,

    /// Publishing outlet, either a plain name or an object with a `name` field
    #[serde(default, alias = "source")]
    pub outlet: Option<serde_json::Value>,

    /// Publication date, `YYYY-MM-DD` or RFC 3339
    #[serde(default, alias = "date", alias = "publishedAt", alias = "published_at")]
    pub published_date: Option<String>,

    /// Language code
    #[serde(default, alias = "lang")]
    pub language: Option<String>,
}

impl RawArticle {
    /// Outlet name, whichever shape the provider used
    pub fn outlet_name(&self) -> Option<String> {
        match self.outlet.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(obj) => obj
                .get("name")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            _ => None,
        }
    }
}

/// A normalized article candidate
///
/// Immutable once normalized; produced per fetch and consumed only by the
/// extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleCandidate {
    /// Headline
    pub title: String,

    /// Body snippet (may be empty)
    pub body_snippet: String,

    /// Canonical article URL
    pub url: String,

    /// Publishing outlet (may be empty)
    pub outlet: String,

    /// Publication date
    pub published_date: NaiveDate,

    /// Language code, `und` when unknown
    pub language: String,

    /// Company this article was fetched for
    pub source_company_ref: String,
}
