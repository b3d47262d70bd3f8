//! News source backed by a directory of JSON files.
//!
//! Each company's articles live in `<dir>/<company-slug>.json` as a JSON array
//! of raw article records in whatever shape the upstream provider produced.

use async_trait::async_trait;
use chrono::NaiveDate;
use sentinel_domain::traits::NewsSource;
use sentinel_domain::{Company, RawArticle};
use sentinel_extractor::parse_date;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors reading article files.
#[derive(Debug, Error)]
pub enum SourceError {
    /// File exists but could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// File is not a JSON array of articles
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },
}

/// Reads per-company article files from a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    /// Create a source over `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The file holding `company`'s articles.
    pub fn path_for(&self, company: &Company) -> PathBuf {
        self.dir.join(format!("{}.json", company.slug()))
    }

    fn read_all(&self, path: &Path) -> Result<Vec<RawArticle>, SourceError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No article file");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(SourceError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&contents).map_err(|source| SourceError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[async_trait]
impl NewsSource for DirectorySource {
    type Error = SourceError;

    /// Articles in `language` published within `from..=until`.
    ///
    /// Articles without a language are served with the company's first
    /// language so they are not returned twice. Articles with an unreadable
    /// date are passed through for the normalizer to reject.
    async fn fetch(
        &self,
        company: &Company,
        language: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<RawArticle>, Self::Error> {
        let primary = company.languages.first().map(String::as_str).unwrap_or("en");
        let articles = self.read_all(&self.path_for(company))?;

        Ok(articles
            .into_iter()
            .filter(|a| match a.language.as_deref() {
                Some(lang) => lang.trim().eq_ignore_ascii_case(language),
                None => language == primary,
            })
            .filter(|a| {
                a.published_date
                    .as_deref()
                    .and_then(parse_date)
                    .map_or(true, |date| (from..=until).contains(&date))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_fixture(dir: &Path) {
        std::fs::write(
            dir.join("acme-corp.json"),
            r#"[
                {"title": "Old news", "url": "https://a.example/1", "date": "2024-03-01", "language": "en"},
                {"title": "Fresh news", "url": "https://a.example/2", "date": "2024-04-22", "language": "en"},
                {"title": "Neue Nachricht", "url": "https://a.example/3", "date": "2024-04-23", "language": "DE"},
                {"title": "No language", "url": "https://a.example/4", "date": "2024-04-23"},
                {"title": "Bad date", "url": "https://a.example/5", "date": "yesterday", "language": "en"}
            ]"#,
        )
        .unwrap();
    }

    fn company() -> Company {
        let mut company = Company::new("Acme Corp", "ACME");
        company.languages = vec!["en".to_string(), "de".to_string()];
        company
    }

    fn from() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 15).unwrap()
    }

    fn until() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 28).unwrap()
    }

    fn titles(articles: &[RawArticle]) -> Vec<&str> {
        articles.iter().filter_map(|a| a.title.as_deref()).collect()
    }

    #[tokio::test]
    async fn test_filters_by_language_and_date() {
        let dir = TempDir::new().unwrap();
        write_fixture(dir.path());
        let source = DirectorySource::new(dir.path());

        let en = source.fetch(&company(), "en", from(), until()).await.unwrap();
        assert_eq!(titles(&en), vec!["Fresh news", "No language", "Bad date"]);

        let de = source.fetch(&company(), "de", from(), until()).await.unwrap();
        assert_eq!(titles(&de), vec!["Neue Nachricht"]);
    }

    #[tokio::test]
    async fn test_articles_after_window_are_excluded() {
        let dir = TempDir::new().unwrap();
        write_fixture(dir.path());
        let source = DirectorySource::new(dir.path());

        let until = NaiveDate::from_ymd_opt(2024, 4, 22).unwrap();
        let en = source.fetch(&company(), "en", from(), until).await.unwrap();
        assert_eq!(titles(&en), vec!["Fresh news", "Bad date"]);

        let de = source.fetch(&company(), "de", from(), until).await.unwrap();
        assert!(de.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let source = DirectorySource::new(dir.path());
        let articles = source.fetch(&Company::new("Globex", "GLBX"), "en", from(), until()).await.unwrap();
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("globex.json"), "{not json").unwrap();
        let source = DirectorySource::new(dir.path());

        let result = source.fetch(&Company::new("Globex", "GLBX"), "en", from(), until()).await;
        assert!(matches!(result, Err(SourceError::Parse { .. })));
    }
}
