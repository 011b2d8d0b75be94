//! Heuristic removal of fraudulent or automated plays.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::anomaly::rules::AnomalyRules;
use crate::model::PlayEvent;

/// Counts of what the detector discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub examined: u64,
    /// Dropped by a per-record rule.
    pub record_discards: u64,
    /// (artist, track) groups judged to be rapid-repeat abuse.
    pub flagged_groups: u64,
    /// Events dropped with those groups.
    pub sequence_discards: u64,
    pub kept: u64,
}

impl AnomalyReport {
    pub fn discarded(&self) -> u64 {
        self.record_discards + self.sequence_discards
    }
}

type GroupKey<'a> = (Option<&'a str>, Option<&'a str>);

/// Applies the per-record rules, then the rapid-play sequence rule.
///
/// Screening never fails; at worst it keeps everything. Surviving events
/// keep their input order.
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    rules: AnomalyRules,
}

impl AnomalyDetector {
    pub fn new(rules: AnomalyRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &AnomalyRules {
        &self.rules
    }

    pub fn screen(&self, events: Vec<PlayEvent>) -> (Vec<PlayEvent>, AnomalyReport) {
        let mut report = AnomalyReport {
            examined: events.len() as u64,
            ..AnomalyReport::default()
        };

        let events: Vec<PlayEvent> = events
            .into_iter()
            .filter(|event| !self.is_suspicious(event))
            .collect();
        report.record_discards = report.examined - events.len() as u64;

        let flagged: HashSet<(Option<String>, Option<String>)> = self
            .rapid_play_groups(&events)
            .into_iter()
            .map(|(artist, track)| (artist.map(str::to_string), track.map(str::to_string)))
            .collect();
        report.flagged_groups = flagged.len() as u64;

        let kept: Vec<PlayEvent> = events
            .into_iter()
            .filter(|event| !flagged.contains(&(event.artist.clone(), event.track.clone())))
            .collect();

        report.kept = kept.len() as u64;
        report.sequence_discards = report.examined - report.record_discards - report.kept;

        if report.discarded() > 0 {
            log::info!(
                "Anomaly screening: {} examined, {} dropped by record rules, {} dropped in {} rapid-play groups",
                report.examined,
                report.record_discards,
                report.sequence_discards,
                report.flagged_groups
            );
        } else {
            log::debug!("Anomaly screening: {} examined, none dropped", report.examined);
        }

        (kept, report)
    }

    /// Whether any per-record rule rejects `event`.
    pub fn is_suspicious(&self, event: &PlayEvent) -> bool {
        if self.rules.is_invalid_country(&event.country) {
            return true;
        }
        if event
            .ip_addr
            .as_deref()
            .is_some_and(|addr| self.rules.is_denied_address(addr))
        {
            return true;
        }
        event
            .artist
            .as_deref()
            .is_some_and(|artist| self.rules.is_denied_artist(artist))
            || event
                .album
                .as_deref()
                .is_some_and(|album| self.rules.is_denied_album(album))
    }

    /// (artist, track) pairs whose plays are mostly rapid repeats.
    fn rapid_play_groups<'a>(&self, events: &'a [PlayEvent]) -> Vec<GroupKey<'a>> {
        let rule = &self.rules.rapid_play;
        // Rules built in code skip validation; saturate rather than panic.
        let max_gap = TimeDelta::try_seconds(rule.max_gap_secs).unwrap_or(TimeDelta::MAX);

        let mut groups: HashMap<GroupKey<'a>, Vec<DateTime<Utc>>> = HashMap::new();
        for event in events {
            groups
                .entry((event.artist.as_deref(), event.track.as_deref()))
                .or_default()
                .push(event.timestamp);
        }

        let mut flagged: Vec<GroupKey<'a>> = groups
            .into_iter()
            .filter(|(_, times)| times.len() > rule.min_group_size)
            .filter_map(|(key, mut times)| {
                times.sort_unstable();
                let rapid = times.windows(2).filter(|w| w[1] - w[0] < max_gap).count();
                let ratio = rapid as f64 / times.len() as f64;
                (ratio > rule.max_rapid_ratio).then(|| {
                    log::debug!(
                        "Rapid-play group {:?} / {:?}: {} of {} plays",
                        key.0,
                        key.1,
                        rapid,
                        times.len()
                    );
                    key
                })
            })
            .collect();
        flagged.sort_unstable();
        flagged
    }
}
