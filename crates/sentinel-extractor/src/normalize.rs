//! Raw provider records into uniform article candidates

use crate::types::{DroppedRecord, NormalizeOutput};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use sentinel_domain::{ArticleCandidate, RawArticle};
use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;

/// Language recorded when the provider gives none
pub const UNDETERMINED_LANGUAGE: &str = "und";

/// Normalize raw articles fetched for `company_ref`
///
/// Records missing a title, URL or publication date are dropped, as are
/// records whose URL or date cannot be parsed. Byte-identical URLs are kept
/// once (first occurrence wins). Input order is otherwise preserved.
pub fn normalize(raw_articles: &[RawArticle], company_ref: &str) -> NormalizeOutput {
    let mut output = NormalizeOutput::default();
    let mut seen_urls = HashSet::new();

    for (index, raw) in raw_articles.iter().enumerate() {
        match normalize_one(raw, company_ref) {
            Ok(candidate) => {
                if seen_urls.insert(candidate.url.clone()) {
                    output.candidates.push(candidate);
                } else {
                    debug!(url = %candidate.url, "Duplicate URL skipped");
                }
            }
            Err(reason) => {
                warn!(company = company_ref, index, %reason, "Dropping article");
                output.dropped.push(DroppedRecord {
                    index,
                    reason,
                    url: non_empty(raw.url.as_deref()).map(str::to_string),
                });
            }
        }
    }

    debug!(
        company = company_ref,
        kept = output.candidates.len(),
        dropped = output.dropped.len(),
        "Normalized articles"
    );
    output
}

fn normalize_one(raw: &RawArticle, company_ref: &str) -> Result<ArticleCandidate, String> {
    let title = non_empty(raw.title.as_deref()).ok_or_else(|| "missing title".to_string())?;
    let url = non_empty(raw.url.as_deref()).ok_or_else(|| "missing url".to_string())?;
    let date = non_empty(raw.published_date.as_deref())
        .ok_or_else(|| "missing published date".to_string())?;

    validate_url(url)?;
    let published_date = parse_date(date).ok_or_else(|| format!("unparseable date '{}'", date))?;

    let language = non_empty(raw.language.as_deref())
        .map(str::to_lowercase)
        .unwrap_or_else(|| UNDETERMINED_LANGUAGE.to_string());

    Ok(ArticleCandidate {
        title: title.to_string(),
        body_snippet: raw.body.as_deref().map(str::trim).unwrap_or_default().to_string(),
        url: url.to_string(),
        outlet: raw.outlet_name().map(|s| s.trim().to_string()).unwrap_or_default(),
        published_date,
        language,
        source_company_ref: company_ref.to_string(),
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn validate_url(raw: &str) -> Result<(), String> {
    let parsed = Url::parse(raw).map_err(|e| format!("unparseable url '{}': {}", raw, e))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host().is_some() => Ok(()),
        "http" | "https" => Err(format!("url '{}' has no host", raw)),
        other => Err(format!("unsupported url scheme '{}'", other)),
    }
}

/// Parse `YYYY-MM-DD`, RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS` timestamp
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}
