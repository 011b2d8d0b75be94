//! Merging the per-provider logs into one chronological corpus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{timestamp, PlayEvent};
use crate::vocab;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Merge two provider logs into one timestamp-ordered corpus.
///
/// Spotify events come first in the concatenation and the sort is stable,
/// so equal timestamps keep (provider, input) order. Nothing is dropped or
/// duplicated here.
pub fn consolidate(spotify: Vec<PlayEvent>, apple_music: Vec<PlayEvent>) -> Vec<PlayEvent> {
    let mut events = spotify;
    events.extend(apple_music);
    events.sort_by_key(|event| event.timestamp);
    events
}

/// Whether `events` is in non-decreasing timestamp order.
pub fn is_chronological(events: &[PlayEvent]) -> bool {
    events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
}

/// Headline numbers for a consolidated corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationSummary {
    pub total_events: u64,
    pub by_provider: BTreeMap<String, u64>,
    /// Earliest and latest real play; fallback timestamps are ignored.
    pub first_play: Option<String>,
    pub last_play: Option<String>,
    pub span_days: i64,
    pub total_hours: f64,
    /// Event counts per platform category.
    pub platforms: BTreeMap<String, u64>,
    pub fallback_timestamps: u64,
}

impl ConsolidationSummary {
    pub fn from_events(events: &[PlayEvent]) -> Self {
        let mut summary = Self {
            total_events: events.len() as u64,
            ..Self::default()
        };

        let mut total_ms: u64 = 0;
        let mut range: Option<(DateTime<Utc>, DateTime<Utc>)> = None;

        for event in events {
            *summary
                .by_provider
                .entry(event.provider.to_string())
                .or_default() += 1;
            *summary
                .platforms
                .entry(vocab::platform_category(&event.platform).to_string())
                .or_default() += 1;
            total_ms += event.duration_played;

            if event.has_known_time() {
                let ts = event.timestamp;
                range = Some(range.map_or((ts, ts), |(lo, hi)| (lo.min(ts), hi.max(ts))));
            } else {
                summary.fallback_timestamps += 1;
            }
        }

        summary.total_hours = total_ms as f64 / MS_PER_HOUR;
        if let Some((first, last)) = range {
            summary.first_play = Some(timestamp::format_instant(&first));
            summary.last_play = Some(timestamp::format_instant(&last));
            summary.span_days = (last - first).num_days();
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Provider;
    use chrono::{TimeDelta, TimeZone};

    fn at(provider: Provider, hour: u32, track: &str) -> PlayEvent {
        PlayEvent::new(Utc.with_ymd_and_hms(2021, 1, 1, hour, 0, 0).unwrap(), provider)
            .with_track(track)
            .with_duration(1_800_000)
    }

    #[test]
    fn test_consolidate_sorts_and_keeps_everything() {
        let spotify = vec![at(Provider::Spotify, 5, "s1"), at(Provider::Spotify, 1, "s2")];
        let apple = vec![at(Provider::AppleMusic, 3, "a1")];

        let merged = consolidate(spotify, apple);
        assert_eq!(merged.len(), 3);
        assert!(is_chronological(&merged));
        let tracks: Vec<_> = merged.iter().filter_map(|e| e.track.as_deref()).collect();
        assert_eq!(tracks, ["s2", "a1", "s1"]);
    }

    #[test]
    fn test_ties_keep_spotify_first() {
        let merged = consolidate(
            vec![at(Provider::Spotify, 2, "s")],
            vec![at(Provider::AppleMusic, 2, "a")],
        );
        assert_eq!(merged[0].provider, Provider::Spotify);
        assert_eq!(merged[1].provider, Provider::AppleMusic);
    }

    #[test]
    fn test_fallback_events_sort_first() {
        let broken = PlayEvent::new(timestamp::fallback_instant(), Provider::AppleMusic);
        let merged = consolidate(vec![at(Provider::Spotify, 0, "s")], vec![broken]);
        assert!(!merged[0].has_known_time());
    }

    #[test]
    fn test_one_side_empty() {
        let merged = consolidate(Vec::new(), vec![at(Provider::AppleMusic, 1, "a")]);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_summary() {
        let mut late = at(Provider::AppleMusic, 0, "a");
        late.timestamp += TimeDelta::days(10);
        let events = consolidate(
            vec![
                at(Provider::Spotify, 1, "s").with_platform("Android OS 10"),
                PlayEvent::new(timestamp::fallback_instant(), Provider::Spotify),
            ],
            vec![late.with_platform("iOS")],
        );

        let summary = ConsolidationSummary::from_events(&events);
        assert_eq!(summary.total_events, 3);
        assert_eq!(summary.by_provider["Spotify"], 2);
        assert_eq!(summary.by_provider["Apple Music"], 1);
        assert_eq!(summary.first_play.as_deref(), Some("2021-01-01T01:00:00Z"));
        assert_eq!(summary.span_days, 9);
        assert_eq!(summary.fallback_timestamps, 1);
        assert!((summary.total_hours - 1.0).abs() < 1e-9);
        assert_eq!(summary.platforms["Android"], 1);
        assert_eq!(summary.platforms["Unknown"], 1);
    }

    #[test]
    fn test_summary_of_empty_corpus() {
        let summary = ConsolidationSummary::from_events(&[]);
        assert_eq!(summary.total_events, 0);
        assert!(summary.first_play.is_none());
    }
}
