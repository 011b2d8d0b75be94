//! Accumulators and small numeric helpers shared by the rollups.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::PlayEvent;

pub(crate) const MS_PER_MINUTE: f64 = 60_000.0;
pub(crate) const MS_PER_HOUR: f64 = 3_600_000.0;

/// Label used for empty categorical values.
pub const UNKNOWN_LABEL: &str = "Unknown";

pub fn ms_to_minutes(ms: u64) -> f64 {
    ms as f64 / MS_PER_MINUTE
}

pub fn ms_to_hours(ms: u64) -> f64 {
    ms as f64 / MS_PER_HOUR
}

/// `part / whole` as a percentage; 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// `numerator / denominator`; 0 when the denominator is 0.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

pub fn label_or_unknown(value: &str) -> &str {
    if value.is_empty() {
        UNKNOWN_LABEL
    } else {
        value
    }
}

/// Occurrence counts keyed by name.
///
/// Backed by a `BTreeMap`, so iteration, ranking ties and serialized output
/// all follow key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tally<K: Ord = String> {
    counts: BTreeMap<K, u64>,
}

impl<K: Ord + Clone> Tally<K> {
    pub fn new() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, key: K) {
        *self.counts.entry(key).or_default() += 1;
    }

    pub fn get(&self, key: &K) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Entries by count descending, then key ascending, at most `limit`.
    pub fn ranked(&self, limit: usize) -> Vec<(K, u64)> {
        let mut entries: Vec<(K, u64)> = self
            .counts
            .iter()
            .map(|(key, count)| (key.clone(), *count))
            .collect();
        // Stable sort over key-ordered input keeps ties in key order.
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(limit);
        entries
    }

    /// The most frequent key; ties go to the smallest key.
    pub fn top(&self) -> Option<(K, u64)> {
        let mut best: Option<(&K, u64)> = None;
        for (key, count) in &self.counts {
            if best.map_or(true, |(_, current)| *count > current) {
                best = Some((key, *count));
            }
        }
        best.map(|(key, count)| (key.clone(), count))
    }

    /// Sum of the `n` largest counts.
    pub fn top_n_total(&self, n: usize) -> u64 {
        self.ranked(n).iter().map(|(_, count)| count).sum()
    }

    pub fn to_map(&self) -> BTreeMap<K, u64> {
        self.counts.clone()
    }
}

/// Play count and accumulated milliseconds for one time bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayTime {
    pub plays: u64,
    pub ms_played: u64,
}

impl PlayTime {
    pub fn add(&mut self, duration_played: u64) {
        self.plays += 1;
        self.ms_played += duration_played;
    }
}

/// `BTreeMap<K, PlayTime>` helpers.
pub(crate) fn bump<K: Ord>(buckets: &mut BTreeMap<K, PlayTime>, key: K, duration_played: u64) {
    buckets.entry(key).or_default().add(duration_played);
}

/// Key of the bucket with the most plays; ties go to the smallest key.
pub(crate) fn busiest<K: Ord + Clone>(buckets: &BTreeMap<K, PlayTime>) -> Option<(K, u64)> {
    let mut best: Option<(&K, u64)> = None;
    for (key, bucket) in buckets {
        if best.map_or(true, |(_, plays)| bucket.plays > plays) {
            best = Some((key, bucket.plays));
        }
    }
    best.map(|(key, plays)| (key.clone(), plays))
}

/// Running counts behind the four behavioural rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BehaviorCounts {
    pub plays: u64,
    pub skipped: u64,
    pub completed: u64,
    pub offline: u64,
    pub shuffled: u64,
}

impl BehaviorCounts {
    pub fn record(&mut self, event: &PlayEvent) {
        self.plays += 1;
        if event.skipped {
            self.skipped += 1;
        }
        if event.is_completed() {
            self.completed += 1;
        }
        if event.offline == Some(true) {
            self.offline += 1;
        }
        if event.shuffle == Some(true) {
            self.shuffled += 1;
        }
    }

    pub fn rates(&self) -> Rates {
        Rates {
            skip_rate_percentage: percentage(self.skipped, self.plays),
            completion_rate_percentage: percentage(self.completed, self.plays),
            offline_percentage: percentage(self.offline, self.plays),
            shuffle_percentage: percentage(self.shuffled, self.plays),
        }
    }
}

/// Behavioural rates, each a percentage of plays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    pub skip_rate_percentage: f64,
    pub completion_rate_percentage: f64,
    pub offline_percentage: f64,
    pub shuffle_percentage: f64,
}
