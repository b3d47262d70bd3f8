//! Incident deduplication and reconciliation with the prior week
//!
//! Two incidents describe the same event when they belong to the same company
//! and either share an evidence URL, or have near-identical normalized titles
//! and were first seen within a few days of each other. Matching incidents are
//! merged as connected components, repeated until nothing else matches, so the
//! result depends only on the set of incidents, never on their order.

use crate::config::ExtractorConfig;
use sentinel_domain::{CompanySnapshot, Incident, IncidentId, IncidentStatus};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use strsim::normalized_levenshtein;
use tracing::{debug, info};

/// Merges incidents that describe the same real-world event
#[derive(Debug, Clone)]
pub struct Deduplicator {
    title_similarity_threshold: f64,
    date_window_days: i64,
    max_key_quotes: usize,
}

impl Deduplicator {
    /// Build from the extractor configuration
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            title_similarity_threshold: config.title_similarity_threshold,
            date_window_days: config.date_window_days,
            max_key_quotes: config.max_key_quotes.max(1),
        }
    }

    /// Whether two incidents are the same event
    pub fn is_same_event(&self, a: &Incident, b: &Incident) -> bool {
        if a.company_ref != b.company_ref {
            return false;
        }
        if !a.evidence_urls.is_disjoint(&b.evidence_urls) {
            return true;
        }
        let days_apart = (a.first_seen_date - b.first_seen_date).num_days().abs();
        days_apart <= self.date_window_days
            && title_similarity(&a.title, &b.title) >= self.title_similarity_threshold
    }

    /// Merge same-event incidents; output is sorted by incident id
    pub fn dedupe(&self, incidents: Vec<Incident>) -> Vec<Incident> {
        let input_len = incidents.len();
        let mut current = incidents;
        let mut rounds = 0;

        loop {
            let groups = self.connected_components(&current);
            if groups.iter().all(|group| group.len() == 1) {
                break;
            }
            rounds += 1;

            let mut slots: Vec<Option<Incident>> = current.into_iter().map(Some).collect();
            current = groups
                .into_iter()
                .map(|group| {
                    let members = group.into_iter().filter_map(|idx| slots[idx].take()).collect();
                    self.merge(members)
                })
                .collect();
        }

        current.sort_by(|a, b| {
            a.incident_id
                .cmp(&b.incident_id)
                .then_with(|| a.title.cmp(&b.title))
                .then_with(|| a.first_seen_date.cmp(&b.first_seen_date))
        });

        if current.len() != input_len {
            debug!(before = input_len, after = current.len(), rounds, "Merged duplicate incidents");
        }
        current
    }

    /// Merge a group of same-event incidents into one
    ///
    /// The representative (highest severity, ties broken by category, summary,
    /// title and id) supplies category, title and summary. Evidence and
    /// languages are unioned, quotes made distinct and capped, the earliest
    /// first-seen date and highest confidence kept, and the id recomputed.
    /// A single incident is returned unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `members` is empty.
    pub fn merge(&self, mut members: Vec<Incident>) -> Incident {
        let rep_idx = members
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| representative_key(a).cmp(&representative_key(b)))
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        let mut merged = members.swap_remove(rep_idx);
        if members.is_empty() {
            return merged;
        }

        let mut quotes: BTreeSet<String> = merged.key_quotes.drain(..).collect();
        for member in members {
            merged.evidence_urls.extend(member.evidence_urls);
            merged.languages.extend(member.languages);
            quotes.extend(member.key_quotes);
            merged.first_seen_date = merged.first_seen_date.min(member.first_seen_date);
            merged.confidence = merged.confidence.max(member.confidence);
            if member.status == IncidentStatus::Continuing {
                merged.status = IncidentStatus::Continuing;
            }
        }
        merged.key_quotes = quotes.into_iter().take(self.max_key_quotes).collect();
        merged.recompute_id();
        merged
    }

    /// Match this week's incidents against the prior snapshot
    ///
    /// A match adopts the prior incident's id, becomes `Continuing` and keeps
    /// the earlier first-seen date. Each prior incident is claimed at most
    /// once: an incident already carrying a prior id claims it first, then
    /// pairs are taken by URL overlap, then by id. An unmatched incident never
    /// keeps an id held by a prior or adopted incident, so ids stay unique
    /// within the snapshot.
    pub fn reconcile_with_prior(
        &self,
        mut incidents: Vec<Incident>,
        prior: Option<&CompanySnapshot>,
    ) -> Vec<Incident> {
        for incident in &mut incidents {
            incident.status = IncidentStatus::New;
        }
        let Some(prior) = prior else {
            return incidents;
        };

        let mut pairs = Vec::new();
        for (ci, current) in incidents.iter().enumerate() {
            for (pi, previous) in prior.incidents.iter().enumerate() {
                let same_id = current.incident_id == previous.incident_id;
                if same_id || self.is_same_event(current, previous) {
                    let overlap = current.evidence_urls.intersection(&previous.evidence_urls).count();
                    pairs.push((same_id, overlap, ci, pi));
                }
            }
        }
        pairs.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| b.1.cmp(&a.1))
                .then_with(|| incidents[a.2].incident_id.cmp(&incidents[b.2].incident_id))
                .then_with(|| prior.incidents[a.3].incident_id.cmp(&prior.incidents[b.3].incident_id))
        });

        let mut claimed_current = HashSet::new();
        let mut claimed_prior = HashSet::new();
        let mut adopted = BTreeSet::new();
        for (_, _, ci, pi) in pairs {
            let previous = &prior.incidents[pi];
            // A prior snapshot may hold one id twice; it is adopted once
            if claimed_current.contains(&ci)
                || claimed_prior.contains(&pi)
                || adopted.contains(&previous.incident_id)
            {
                continue;
            }
            claimed_current.insert(ci);
            claimed_prior.insert(pi);
            adopted.insert(previous.incident_id.clone());

            let current = &mut incidents[ci];
            current.incident_id = previous.incident_id.clone();
            current.status = IncidentStatus::Continuing;
            current.first_seen_date = current.first_seen_date.min(previous.first_seen_date);
        }
        let continuing = claimed_current.len();

        let mut taken: BTreeSet<IncidentId> = prior.incidents.iter().map(|i| i.incident_id.clone()).collect();
        taken.extend(adopted);

        let mut unmatched: Vec<usize> = (0..incidents.len()).filter(|ci| !claimed_current.contains(ci)).collect();
        unmatched.sort_by(|&a, &b| incidents[a].incident_id.cmp(&incidents[b].incident_id));
        for ci in unmatched {
            let current = &mut incidents[ci];
            if taken.contains(&current.incident_id) {
                let base = current.incident_id.clone();
                let mut attempt = 1;
                let mut candidate = base.rehash(attempt);
                while taken.contains(&candidate) {
                    attempt += 1;
                    candidate = base.rehash(attempt);
                }
                debug!(from = %base, to = %candidate, "Re-derived colliding incident id");
                current.incident_id = candidate;
            }
            taken.insert(current.incident_id.clone());
        }

        incidents.sort_by(|a, b| a.incident_id.cmp(&b.incident_id));
        info!(
            company = %prior.company_ref,
            continuing,
            new = incidents.len() - continuing,
            "Reconciled with prior week"
        );
        incidents
    }

    fn connected_components(&self, incidents: &[Incident]) -> Vec<Vec<usize>> {
        let mut parent: Vec<usize> = (0..incidents.len()).collect();

        for i in 0..incidents.len() {
            for j in (i + 1)..incidents.len() {
                if self.is_same_event(&incidents[i], &incidents[j]) {
                    let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                    if ri != rj {
                        parent[rj.max(ri)] = ri.min(rj);
                    }
                }
            }
        }

        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..incidents.len() {
            let root = find(&mut parent, i);
            groups.entry(root).or_default().push(i);
        }
        groups.into_values().collect()
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(&ExtractorConfig::default())
    }
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn representative_key(incident: &Incident) -> impl Ord + '_ {
    (
        incident.severity,
        incident.category,
        incident.summary_en.as_str(),
        incident.title.as_str(),
        &incident.incident_id,
    )
}

/// Lowercase, keep letters, digits and single spaces
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized Levenshtein similarity of two titles, 0.0 when either is empty
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a = normalize_title(a);
    let b = normalize_title(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    normalized_levenshtein(&a, &b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use sentinel_domain::{Category, WeekKey};

    fn incident(company: &str, title: &str, urls: &[&str], day: u32, severity: u8) -> Incident {
        let mut incident = Incident {
            incident_id: IncidentId::from_string("tmp"),
            company_ref: company.to_string(),
            title: title.to_string(),
            category: Category::Legal,
            severity,
            confidence: 0.5,
            summary_en: format!("{} summary.", title),
            key_quotes: Vec::new(),
            evidence_urls: urls.iter().map(|u| u.to_string()).collect(),
            first_seen_date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            languages: ["en".to_string()].into_iter().collect(),
            status: IncidentStatus::New,
        };
        incident.recompute_id();
        incident
    }

    #[test]
    fn test_url_overlap_merges() {
        let dedup = Deduplicator::default();
        let a = incident("Acme", "Probe opened", &["u1", "u2"], 22, 3);
        let b = incident("Acme", "Completely different words", &["u2", "u3"], 10, 4);

        let merged = dedup.dedupe(vec![a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].evidence_urls.len(), 3);
        assert_eq!(merged[0].title, "Completely different words");
        assert_eq!(merged[0].incident_id, IncidentId::compute("Acme", ["u1", "u2", "u3"]));
    }

    #[test]
    fn test_title_match_needs_date_window() {
        let dedup = Deduplicator::default();
        let a = incident("Acme", "Regulator opens probe into Acme!", &["u1"], 22, 3);
        let b = incident("Acme", "regulator opens probe into acme", &["u2"], 25, 3);
        let c = incident("Acme", "Regulator opens probe into Acme", &["u3"], 29, 3);

        let merged = dedup.dedupe(vec![a, b, c]);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().any(|i| i.evidence_urls.len() == 2));
    }

    #[test]
    fn test_different_companies_never_merge() {
        let dedup = Deduplicator::default();
        let a = incident("Acme", "Probe", &["u1"], 22, 3);
        let b = incident("Globex", "Probe", &["u1"], 22, 3);
        assert_eq!(dedup.dedupe(vec![a, b]).len(), 2);
    }

    #[test]
    fn test_transitive_chain_merges() {
        let dedup = Deduplicator::default();
        let a = incident("Acme", "Alpha", &["u1"], 1, 2);
        let b = incident("Acme", "Bravo", &["u1", "u2"], 10, 2);
        let c = incident("Acme", "Charlie", &["u2"], 20, 2);
        assert_eq!(dedup.dedupe(vec![a, b, c]).len(), 1);
    }

    #[test]
    fn test_merge_rules() {
        let dedup = Deduplicator::default();
        let mut a = incident("Acme", "Minor", &["u1"], 22, 2);
        a.confidence = 0.9;
        a.key_quotes = vec!["d".to_string(), "b".to_string()];
        a.languages = ["de".to_string()].into_iter().collect();
        let mut b = incident("Acme", "Major", &["u1", "u2"], 24, 5);
        b.category = Category::Environmental;
        b.key_quotes = vec!["a".to_string(), "c".to_string(), "b".to_string()];

        let merged = dedup.merge(vec![a, b]);
        assert_eq!(merged.title, "Major");
        assert_eq!(merged.severity, 5);
        assert_eq!(merged.category, Category::Environmental);
        assert_eq!(merged.summary_en, "Major summary.");
        assert_eq!(merged.confidence, 0.9);
        assert_eq!(merged.key_quotes, vec!["a", "b", "c"]);
        assert_eq!(merged.first_seen_date, NaiveDate::from_ymd_opt(2024, 4, 22).unwrap());
        assert_eq!(merged.languages.len(), 2);
    }

    #[test]
    fn test_singleton_unchanged() {
        let dedup = Deduplicator::default();
        let mut a = incident("Acme", "Alone", &["u1"], 22, 3);
        a.incident_id = IncidentId::from_string("carried-over");
        let out = dedup.dedupe(vec![a.clone()]);
        assert_eq!(out, vec![a]);
    }

    #[test]
    fn test_fixpoint_after_merge() {
        let dedup = Deduplicator::default();
        // A and B share a URL; the merged incident takes B's title and A's
        // date, which only then brings it within C's title window.
        let a = incident("Acme", "Unrelated headline", &["u1"], 10, 2);
        let b = incident("Acme", "Acme fined over river pollution", &["u1"], 14, 4);
        let c = incident("Acme", "Acme fined over river pollution.", &["u9"], 8, 3);

        let merged = dedup.dedupe(vec![a, b, c]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].first_seen_date, NaiveDate::from_ymd_opt(2024, 4, 8).unwrap());
    }

    #[test]
    fn test_title_similarity() {
        assert_eq!(title_similarity("Acme, fined!", "acme fined"), 1.0);
        assert_eq!(title_similarity("", "acme"), 0.0);
        assert!(title_similarity("Acme fined", "Globex sued") < 0.5);
        assert_eq!(normalize_title("  Hello,   World! "), "hello world");
    }

    fn snapshot(incidents: Vec<Incident>) -> CompanySnapshot {
        CompanySnapshot::new("Acme", WeekKey::new(2024, 16).unwrap(), incidents)
    }

    #[test]
    fn test_reconcile_adopts_prior_id() {
        let dedup = Deduplicator::default();
        let prior = snapshot(vec![incident("Acme", "Probe opened", &["u1"], 15, 3)]);
        let prior_id = prior.incidents[0].incident_id.clone();

        let current = vec![
            incident("Acme", "Probe widens", &["u1", "u5"], 22, 4),
            incident("Acme", "Something new", &["u7"], 22, 2),
        ];
        let reconciled = dedup.reconcile_with_prior(current, Some(&prior));

        let continuing: Vec<_> = reconciled
            .iter()
            .filter(|i| i.status == IncidentStatus::Continuing)
            .collect();
        assert_eq!(continuing.len(), 1);
        assert_eq!(continuing[0].incident_id, prior_id);
        assert_eq!(continuing[0].first_seen_date, NaiveDate::from_ymd_opt(2024, 4, 15).unwrap());
        assert_eq!(reconciled.iter().filter(|i| i.status == IncidentStatus::New).count(), 1);
    }

    #[test]
    fn test_reconcile_claims_prior_once() {
        let dedup = Deduplicator::default();
        let prior = snapshot(vec![incident("Acme", "Probe", &["u1", "u2"], 20, 3)]);
        let current = vec![
            incident("Acme", "One", &["u1", "u2"], 22, 3),
            incident("Acme", "Two", &["u2", "u3"], 22, 3),
        ];

        let reconciled = dedup.reconcile_with_prior(current, Some(&prior));
        let ids: BTreeSet<_> = reconciled.iter().map(|i| i.incident_id.clone()).collect();
        assert_eq!(ids.len(), 2);
        let winner = reconciled.iter().find(|i| i.status == IncidentStatus::Continuing).unwrap();
        assert_eq!(winner.title, "One");
    }

    #[test]
    fn test_reconcile_keeps_ids_unique_across_inherited_chain() {
        let dedup = Deduplicator::default();
        // Last week's incident covered a and b but carries the id it
        // inherited from an even earlier week, which equals h(a).
        let mut inherited = incident("Acme", "Probe opened", &["a", "b"], 15, 3);
        inherited.incident_id = IncidentId::compute("Acme", ["a"]);
        let prior = snapshot(vec![inherited]);

        let current = dedup.dedupe(vec![
            incident("Acme", "Regulators widen inquiry", &["b"], 22, 3),
            incident("Acme", "Unrelated product recall", &["a"], 23, 2),
        ]);
        assert_eq!(current.len(), 2);

        let reconciled = dedup.reconcile_with_prior(current, Some(&prior));
        let ids: BTreeSet<_> = reconciled.iter().map(|i| i.incident_id.clone()).collect();
        assert_eq!(ids.len(), 2);

        let continuing: Vec<_> = reconciled
            .iter()
            .filter(|i| i.status == IncidentStatus::Continuing)
            .collect();
        assert_eq!(continuing.len(), 1);
        assert_eq!(continuing[0].incident_id, IncidentId::compute("Acme", ["a"]));

        let snapshot = snapshot(reconciled);
        assert_eq!(snapshot.metrics.incident_count, snapshot.incident_ids().len());
    }

    #[test]
    fn test_duplicate_prior_id_is_adopted_once() {
        let dedup = Deduplicator::default();
        // Both prior incidents carry the same id, as an older state could
        let mut p1 = incident("Acme", "Probe opened", &["b"], 15, 3);
        p1.incident_id = IncidentId::compute("Acme", ["a"]);
        let mut p2 = incident("Acme", "Chemical spill reported", &["c"], 15, 2);
        p2.incident_id = IncidentId::compute("Acme", ["a"]);
        let prior = snapshot(vec![p1, p2]);

        let current = vec![
            incident("Acme", "Probe widens", &["b"], 22, 3),
            incident("Acme", "Spill spreads downstream", &["c"], 22, 2),
            incident("Acme", "Unrelated recall", &["a"], 23, 2),
        ];
        let reconciled = dedup.reconcile_with_prior(current, Some(&prior));

        let ids: BTreeSet<_> = reconciled.iter().map(|i| i.incident_id.clone()).collect();
        assert_eq!(ids.len(), 3);
        let continuing: Vec<_> = reconciled
            .iter()
            .filter(|i| i.status == IncidentStatus::Continuing)
            .collect();
        assert_eq!(continuing.len(), 1);
        assert_eq!(continuing[0].title, "Unrelated recall");
    }

    #[test]
    fn test_unmatched_incident_with_taken_id_is_rederived() {
        let dedup = Deduplicator::default();
        let prior = snapshot(vec![incident("Acme", "Recall announced", &["a"], 15, 3)]);
        let prior_id = prior.incidents[0].incident_id.clone();

        // Not deduped: the second incident carries the same id on other evidence
        let first = incident("Acme", "Recall announced", &["a"], 22, 3);
        let mut second = incident("Acme", "Unrelated hiring freeze", &["q"], 23, 1);
        second.incident_id = prior_id.clone();

        let reconciled = dedup.reconcile_with_prior(vec![first, second], Some(&prior));
        let continuing = reconciled.iter().find(|i| i.status == IncidentStatus::Continuing).unwrap();
        assert_eq!(continuing.incident_id, prior_id);
        let new = reconciled.iter().find(|i| i.status == IncidentStatus::New).unwrap();
        assert_eq!(new.incident_id, prior_id.rehash(1));
    }

    #[test]
    fn test_reconcile_without_prior() {
        let dedup = Deduplicator::default();
        let mut a = incident("Acme", "Probe", &["u1"], 22, 3);
        a.status = IncidentStatus::Continuing;
        let out = dedup.reconcile_with_prior(vec![a], None);
        assert_eq!(out[0].status, IncidentStatus::New);
    }

    const TITLES: &[&str] = &[
        "Acme fined over river pollution",
        "Acme fined over river pollution!",
        "Acme fined over river pollutions",
        "Workers strike at Acme plant",
        "Globex accounting probe",
    ];

    fn arb_incident() -> impl Strategy<Value = Incident> {
        (
            prop::sample::select(vec!["Acme", "Globex"]),
            prop::sample::select(TITLES.to_vec()),
            1u8..=5,
            0u32..=100,
            prop::collection::btree_set(0usize..8, 1..3),
            1u32..=14,
            prop::collection::vec(prop::sample::select(vec!["q1", "q2", "q3", "q4"]), 0..3),
            prop::sample::select(vec!["en", "de", "fr"]),
            prop::sample::select(Category::ALL.to_vec()),
        )
            .prop_map(|(company, title, severity, conf, urls, day, quotes, lang, category)| {
                let urls: Vec<String> = urls.iter().map(|n| format!("https://n{}.example", n)).collect();
                let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();
                let mut i = incident(company, title, &url_refs, day, severity);
                i.confidence = f64::from(conf) / 100.0;
                i.key_quotes = quotes.iter().map(|q| q.to_string()).collect();
                i.languages = [lang.to_string()].into_iter().collect();
                i.category = category;
                i
            })
    }

    proptest! {
        #[test]
        fn prop_dedupe_is_idempotent(incidents in prop::collection::vec(arb_incident(), 0..10)) {
            let dedup = Deduplicator::default();
            let once = dedup.dedupe(incidents);
            let twice = dedup.dedupe(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_dedupe_is_order_independent(
            (original, shuffled) in prop::collection::vec(arb_incident(), 0..10)
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            let dedup = Deduplicator::default();
            prop_assert_eq!(dedup.dedupe(original), dedup.dedupe(shuffled));
        }

        #[test]
        fn prop_dedupe_output_has_no_matching_pairs(incidents in prop::collection::vec(arb_incident(), 0..10)) {
            let dedup = Deduplicator::default();
            let out = dedup.dedupe(incidents);
            for i in 0..out.len() {
                for j in (i + 1)..out.len() {
                    prop_assert!(!dedup.is_same_event(&out[i], &out[j]));
                }
            }
        }
    }
}
