//! Canonical ordering and batching of candidates for classify calls

use sentinel_domain::ArticleCandidate;

/// Splits candidates into classifier-sized batches
///
/// Candidates are first put into a canonical order (URL, then publication
/// date, then title), so the batches, and therefore the grouping the
/// classifier sees, do not depend on the order articles were fetched in.
pub struct CandidateBatcher {
    max_per_batch: usize,
}

impl CandidateBatcher {
    /// Create a batcher; a zero limit is treated as one
    pub fn new(max_per_batch: usize) -> Self {
        Self {
            max_per_batch: max_per_batch.max(1),
        }
    }

    /// Sort and split the candidates
    pub fn batch(&self, mut candidates: Vec<ArticleCandidate>) -> Vec<Vec<ArticleCandidate>> {
        canonical_order(&mut candidates);
        candidates
            .chunks(self.max_per_batch)
            .map(<[ArticleCandidate]>::to_vec)
            .collect()
    }
}

/// Sort candidates into canonical order in place
pub fn canonical_order(candidates: &mut [ArticleCandidate]) {
    candidates.sort_by(|a, b| {
        a.url
            .cmp(&b.url)
            .then_with(|| a.published_date.cmp(&b.published_date))
            .then_with(|| a.title.cmp(&b.title))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn candidate(url: &str, day: u32) -> ArticleCandidate {
        ArticleCandidate {
            title: format!("title {}", url),
            body_snippet: String::new(),
            url: url.to_string(),
            outlet: String::new(),
            published_date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            language: "en".to_string(),
            source_company_ref: "Acme".to_string(),
        }
    }

    #[test]
    fn test_single_batch_when_small() {
        let batches = CandidateBatcher::new(10).batch(vec![candidate("b", 1), candidate("a", 2)]);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0].url, "a");
    }

    #[test]
    fn test_split_respects_limit() {
        let input: Vec<_> = (1..=7).map(|d| candidate(&format!("u{}", d), d)).collect();
        let batches = CandidateBatcher::new(3).batch(input);
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[test]
    fn test_batches_independent_of_input_order() {
        let forward: Vec<_> = (1..=5).map(|d| candidate(&format!("u{}", d), d)).collect();
        let mut reversed = forward.clone();
        reversed.reverse();

        let batcher = CandidateBatcher::new(2);
        assert_eq!(batcher.batch(forward), batcher.batch(reversed));
    }

    #[test]
    fn test_empty_input() {
        assert!(CandidateBatcher::new(5).batch(Vec::new()).is_empty());
    }

    #[test]
    fn test_zero_limit_treated_as_one() {
        let batches = CandidateBatcher::new(0).batch(vec![candidate("a", 1), candidate("b", 1)]);
        assert_eq!(batches.len(), 2);
    }
}
