//! Portfolio companies

use serde::{Deserialize, Serialize};

/// A company in the monitored portfolio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Display name; also the `company_ref` key used throughout the pipeline
    pub name: String,

    /// Exchange ticker
    #[serde(default)]
    pub ticker: String,

    /// Alternative names used in search queries
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Languages to search news in
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}

impl Company {
    /// Create a company with no aliases, searched in English only
    pub fn new(name: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ticker: ticker.into(),
            aliases: Vec::new(),
            languages: default_languages(),
        }
    }

    /// The key this company's incidents and snapshots are stored under
    pub fn company_ref(&self) -> &str {
        &self.name
    }

    /// Filesystem- and URL-safe form of the name
    ///
    /// ```
    /// use sentinel_domain::Company;
    ///
    /// assert_eq!(Company::new("Acme Corp.", "ACME").slug(), "acme-corp");
    /// ```
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.name.len());
        let mut pending_dash = false;
        for c in self.name.chars() {
            if c.is_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.extend(c.to_lowercase());
            } else {
                pending_dash = true;
            }
        }
        slug
    }

    /// The name followed by its aliases
    pub fn search_terms(&self) -> Vec<&str> {
        std::iter::once(self.name.as_str())
            .chain(self.aliases.iter().map(String::as_str))
            .collect()
    }
}
