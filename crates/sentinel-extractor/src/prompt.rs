//! LLM prompt engineering for incident classification

use sentinel_domain::{ArticleCandidate, Category, Company};

/// Outlets whose reporting is treated as primary or high-priority
pub const HIGH_PRIORITY_SOURCES: &[&str] = &[
    "department of justice",
    "commission",
    "court",
    "reuters",
    "bloomberg",
    "financial times",
];

/// Maximum characters of body text included per article
const MAX_SNIPPET_CHARS: usize = 500;

/// Whether an outlet name matches one of the high-priority sources
pub fn is_high_priority(outlet: &str) -> bool {
    let outlet = outlet.to_lowercase();
    HIGH_PRIORITY_SOURCES.iter().any(|source| outlet.contains(source))
}

/// Builds prompts asking the LLM to group articles into incidents
pub struct PromptBuilder<'a> {
    company: &'a Company,
    candidates: &'a [ArticleCandidate],
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(company: &'a Company, candidates: &'a [ArticleCandidate]) -> Self {
        Self { company, candidates }
    }

    /// Build the complete classification prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        // 1. Instruction and scales
        prompt.push_str(CLASSIFICATION_INSTRUCTIONS);
        prompt.push_str("\n\n");

        // 2. Company context
        prompt.push_str(&format!("Company: {}\n", self.company.name));
        if !self.company.ticker.is_empty() {
            prompt.push_str(&format!("Ticker: {}\n", self.company.ticker));
        }
        if !self.company.aliases.is_empty() {
            prompt.push_str(&format!("Also known as: {}\n", self.company.aliases.join(", ")));
        }
        let categories: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
        prompt.push_str(&format!("Allowed categories: {}\n\n", categories.join(", ")));

        // 3. The articles, indexed
        prompt.push_str("Articles:\n");
        for (index, candidate) in self.candidates.iter().enumerate() {
            prompt.push_str(&self.format_article(index, candidate));
        }
        prompt.push('\n');

        // 4. Output format reminder
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }

    fn format_article(&self, index: usize, candidate: &ArticleCandidate) -> String {
        let outlet = if candidate.outlet.is_empty() {
            "unknown outlet".to_string()
        } else if is_high_priority(&candidate.outlet) {
            format!("{} [primary source]", candidate.outlet)
        } else {
            candidate.outlet.clone()
        };

        let mut entry = format!(
            "[{}] {} | {} | {} | {}\n    Title: {}\n",
            index, candidate.published_date, outlet, candidate.language, candidate.url, candidate.title
        );
        if !candidate.body_snippet.is_empty() {
            entry.push_str(&format!("    Snippet: {}\n", truncate_chars(&candidate.body_snippet, MAX_SNIPPET_CHARS)));
        }
        entry
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

const CLASSIFICATION_INSTRUCTIONS: &str = r#"You are an ESG controversy analyst. Read the news articles below about one company and identify distinct real-world controversy incidents.

Rules:
- Group articles describing the same event into ONE incident, even when they are in different languages
- Ignore articles that are not about a controversy involving the company (product launches, earnings beats, general market news)
- Prioritize facts from primary sources (courts, regulators) over secondary reporting
- Write the title and summary in English regardless of the article language
- The summary is at most two sentences
- key_quote is a short verbatim excerpt from one of the articles, in its original language
- Severity scale:
  - 1: minor, local coverage, no regulatory angle
  - 2: limited coverage or allegations without follow-up
  - 3: national coverage, formal complaints or lawsuits filed
  - 4: regulatory investigation, major lawsuit, significant fines
  - 5: material impact, criminal charges, regulator enforcement action
- Confidence is your probability (0.0-1.0) that this is a true controversy involving the company"#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (JSON array only, no additional text):
[
  {
    "title": "Short English headline",
    "category": "Legal",
    "severity": 1-5,
    "confidence": 0.0-1.0,
    "summary_en": "One or two sentences.",
    "key_quote": "verbatim excerpt",
    "article_indices": [0, 2]
  }
]

If no article describes a controversy, return [].
Remember: Return ONLY valid JSON, no markdown code blocks, no explanations."#;
