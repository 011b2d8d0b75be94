//! Artist identity resolution between the two providers.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::model::{ArtistMapping, MappingReportEntry, PlayEvent};
use crate::resolve::similarity::SimilarityMetric;

/// Default similarity score at which a candidate counts as the same artist.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Default number of artists eligible for approximate matching.
pub const DEFAULT_TOP_K: usize = 50;

/// Tunables for approximate artist matching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingOptions {
    pub threshold: f64,
    pub top_k: usize,
    pub metric: SimilarityMetric,
}

impl Default for MatchingOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            metric: SimilarityMetric::default(),
        }
    }
}

#[derive(Debug, Clone)]
struct Target {
    name: String,
    lower: String,
}

/// Resolves artist spellings against a fixed target vocabulary.
///
/// Only names in the eligible set are scored approximately; everything else
/// either matches exactly or keeps its own spelling. Resolution is a pure
/// function of (name, targets, eligible set, options).
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    targets: Vec<Target>,
    exact: HashSet<String>,
    eligible: HashSet<String>,
    options: MatchingOptions,
}

impl IdentityResolver {
    pub fn new<T, E>(targets: T, eligible: E, options: MatchingOptions) -> Self
    where
        T: IntoIterator<Item = String>,
        E: IntoIterator<Item = String>,
    {
        // Sorted so the first of several equally good candidates is stable.
        let sorted: BTreeSet<String> = targets.into_iter().collect();
        let targets = sorted
            .iter()
            .map(|name| Target {
                lower: name.to_lowercase(),
                name: name.clone(),
            })
            .collect();

        Self {
            targets,
            exact: sorted.into_iter().collect(),
            eligible: eligible.into_iter().collect(),
            options,
        }
    }

    pub fn options(&self) -> &MatchingOptions {
        &self.options
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn is_eligible(&self, name: &str) -> bool {
        self.eligible.contains(name)
    }

    pub fn resolve(&self, name: &str) -> ArtistMapping {
        if self.exact.contains(name) {
            return ArtistMapping::matched(name, name, 1.0);
        }
        if !self.eligible.contains(name) {
            return ArtistMapping::unresolved(name, 0.0);
        }

        match self.best_candidate(name) {
            Some((candidate, score)) if score >= self.options.threshold => {
                ArtistMapping::matched(name, candidate, score)
            }
            Some((_, score)) => ArtistMapping::unresolved(name, score),
            None => ArtistMapping::unresolved(name, 0.0),
        }
    }

    /// Highest-scoring target; the earliest in name order wins ties.
    fn best_candidate(&self, name: &str) -> Option<(&str, f64)> {
        let lower = name.to_lowercase();
        let mut best: Option<(&str, f64)> = None;
        for target in &self.targets {
            let score = self.options.metric.score_lowercase(&lower, &target.lower);
            if best.map_or(true, |(_, current)| score > current) {
                best = Some((&target.name, score));
            }
        }
        best
    }
}

/// Distinct artist names of a canonical corpus.
pub fn target_vocabulary(events: &[PlayEvent]) -> BTreeSet<String> {
    events
        .iter()
        .filter_map(|event| event.artist.clone())
        .collect()
}

/// The `k` artists with the most accumulated play time, ties by name.
pub fn top_artists_by_duration<'a, I>(plays: I, k: usize) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, u64)>,
{
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for (artist, duration) in plays {
        *totals.entry(artist).or_default() += duration;
    }

    let mut ranked: Vec<(&str, u64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(k)
        .map(|(artist, _)| artist.to_string())
        .collect()
}

/// Collapse per-row mappings into one review entry per distinct source
/// artist, most frequent first.
pub fn mapping_report(mappings: &[ArtistMapping]) -> Vec<MappingReportEntry> {
    let mut grouped: HashMap<&str, (&ArtistMapping, u64)> = HashMap::new();
    for mapping in mappings {
        grouped
            .entry(mapping.source_name.as_str())
            .or_insert((mapping, 0))
            .1 += 1;
    }

    let mut report: Vec<MappingReportEntry> = grouped
        .into_values()
        .map(|(mapping, count)| MappingReportEntry::from_mapping(mapping, count))
        .collect();
    report.sort_by(|a, b| {
        b.occurrence_count
            .cmp(&a.occurrence_count)
            .then_with(|| a.original_artist.cmp(&b.original_artist))
    });
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Provider;
    use crate::model::timestamp::fallback_instant;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn resolver(targets: &[&str], eligible: &[&str]) -> IdentityResolver {
        IdentityResolver::new(names(targets), names(eligible), MatchingOptions::default())
    }

    #[test]
    fn test_exact_match_ignores_eligibility() {
        let resolver = resolver(&["The Beatles", "Queen"], &[]);
        let mapping = resolver.resolve("The Beatles");
        assert!(mapping.matched);
        assert_eq!(mapping.resolved_name, "The Beatles");
        assert!((mapping.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_exact_match_is_case_sensitive() {
        let resolver = resolver(&["Queen"], &[]);
        let mapping = resolver.resolve("queen");
        assert!(!mapping.matched);
        assert_eq!(mapping.resolved_name, "queen");
        assert!(mapping.confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn test_eligible_fuzzy_match() {
        let resolver = resolver(&["Beyoncé", "Coldplay"], &["Beyonce"]);
        let mapping = resolver.resolve("Beyonce");
        assert!(mapping.matched);
        assert_eq!(mapping.resolved_name, "Beyoncé");
        assert!(mapping.confidence >= DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_eligible_below_threshold_keeps_name_and_score() {
        let resolver = resolver(&["Coldplay"], &["Metallica"]);
        let mapping = resolver.resolve("Metallica");
        assert!(!mapping.matched);
        assert_eq!(mapping.resolved_name, "Metallica");
        assert!(mapping.confidence > 0.0 && mapping.confidence < DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_ineligible_is_not_scored() {
        let resolver = resolver(&["Beyoncé"], &[]);
        let mapping = resolver.resolve("Beyonce");
        assert!(!mapping.matched);
        assert!(mapping.confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_target_set() {
        let resolver = resolver(&[], &["Anyone"]);
        let mapping = resolver.resolve("Anyone");
        assert!(!mapping.matched);
        assert_eq!(mapping.resolved_name, "Anyone");
    }

    #[test]
    fn test_tie_goes_to_first_target_by_name() {
        // "ab" scores 0.8 against both "abc" and "abd".
        let resolver = resolver(&["abd", "abc"], &["ab"]);
        let mapping = resolver.resolve("ab");
        assert_eq!(mapping.resolved_name, "abc");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let a = resolver(&["Radiohead", "Radio Dept", "Portishead"], &["Radiohed"]);
        let b = resolver(&["Portishead", "Radio Dept", "Radiohead"], &["Radiohed"]);
        assert_eq!(a.resolve("Radiohed"), b.resolve("Radiohed"));
    }

    #[test]
    fn test_top_artists_by_duration() {
        let plays = [("A", 10), ("B", 30), ("A", 25), ("C", 35), ("D", 1)];
        let top = top_artists_by_duration(plays, 2);
        // A and C tie at 35; name order breaks the tie.
        assert_eq!(top, names(&["A", "C"]));
    }

    #[test]
    fn test_target_vocabulary_skips_missing_artist() {
        let events = vec![
            PlayEvent::new(fallback_instant(), Provider::Spotify).with_artist("X"),
            PlayEvent::new(fallback_instant(), Provider::Spotify),
            PlayEvent::new(fallback_instant(), Provider::Spotify).with_artist("X"),
        ];
        let vocab = target_vocabulary(&events);
        assert_eq!(vocab.len(), 1);
        assert!(vocab.contains("X"));
    }

    #[test]
    fn test_mapping_report_counts_and_orders() {
        let mappings = vec![
            ArtistMapping::unresolved("Zed", 0.0),
            ArtistMapping::matched("Beatles", "The Beatles", 0.85),
            ArtistMapping::unresolved("Abba", 0.0),
            ArtistMapping::matched("Beatles", "The Beatles", 0.85),
        ];
        let report = mapping_report(&mappings);
        assert_eq!(report.len(), 3);
        assert_eq!(report[0].original_artist, "Beatles");
        assert_eq!(report[0].occurrence_count, 2);
        assert_eq!(report[1].original_artist, "Abba");
        assert_eq!(report[2].original_artist, "Zed");
    }
}
