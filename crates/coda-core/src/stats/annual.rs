//! Per-calendar-year recaps.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::{timestamp, PlayEvent};
use crate::stats::common::{
    label_or_unknown, ms_to_hours, ms_to_minutes, ratio, BehaviorCounts, PlayTime, Rates, Tally,
};
use crate::stats::AggregateOptions;
use crate::vocab;

/// Length of each year's top artist/track/album lists.
pub const ANNUAL_TOP_N: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualRecap {
    pub year: i32,
    pub top_artists: Vec<(String, u64)>,
    pub top_tracks: Vec<(String, u64)>,
    pub top_albums: Vec<(String, u64)>,
    pub year_stats: YearStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearStats {
    pub total_plays: u64,
    pub total_minutes: f64,
    pub total_hours: f64,
    pub unique_artists: usize,
    pub unique_tracks: usize,
    pub unique_albums: usize,
    pub unique_days_with_listening: usize,
    pub average_track_length_minutes: f64,
    pub average_daily_minutes: f64,
    #[serde(flatten)]
    pub rates: Rates,
    pub first_play: Option<String>,
    pub last_play: Option<String>,
    pub peak_month: Option<String>,
    pub peak_month_plays: u64,
    pub top_platform: Option<(String, u64)>,
    pub top_provider: Option<(String, u64)>,
    pub provider_breakdown: BTreeMap<String, u64>,
    pub platform_breakdown: BTreeMap<String, u64>,
    pub country_breakdown: BTreeMap<String, u64>,
    /// Twelve buckets, January first, including months without plays.
    pub monthly_breakdown: Vec<MonthBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthBucket {
    pub month: String,
    pub plays: u64,
    pub minutes: f64,
    pub hours: f64,
}

#[derive(Default)]
struct YearAccumulator<'a> {
    total_ms: u64,
    artists: Tally,
    tracks: Tally,
    albums: Tally,
    platforms: Tally,
    providers: Tally,
    countries: Tally,
    months: [PlayTime; 12],
    behavior: BehaviorCounts,
    days: BTreeSet<NaiveDate>,
    first: Option<&'a PlayEvent>,
    last: Option<&'a PlayEvent>,
}

impl<'a> YearAccumulator<'a> {
    fn record(&mut self, event: &'a PlayEvent) {
        let ts = event.timestamp;
        self.total_ms += event.duration_played;
        self.behavior.record(event);

        if let Some(artist) = &event.artist {
            self.artists.add(artist.clone());
        }
        if let Some(track) = &event.track {
            self.tracks.add(track.clone());
        }
        if let Some(album) = &event.album {
            self.albums.add(album.clone());
        }
        self.providers.add(event.provider.to_string());
        self.platforms
            .add(vocab::platform_category(&event.platform).to_string());
        self.countries
            .add(label_or_unknown(&event.country).to_string());

        if let Some(bucket) = self.months.get_mut(ts.month0() as usize) {
            bucket.add(event.duration_played);
        }
        self.days.insert(ts.date_naive());

        if self.first.map_or(true, |f| ts < f.timestamp) {
            self.first = Some(event);
        }
        if self.last.map_or(true, |l| ts >= l.timestamp) {
            self.last = Some(event);
        }
    }

    fn finish(self, year: i32) -> AnnualRecap {
        let plays = self.behavior.plays;
        let total_minutes = ms_to_minutes(self.total_ms);

        // Busiest month; the earliest month wins a tie.
        let mut peak: Option<(usize, u64)> = None;
        for (idx, bucket) in self.months.iter().enumerate() {
            if bucket.plays > peak.map_or(0, |(_, p)| p) {
                peak = Some((idx, bucket.plays));
            }
        }

        let monthly_breakdown = self
            .months
            .iter()
            .zip(1u32..)
            .map(|(bucket, month)| MonthBucket {
                month: vocab::month_name(month).to_string(),
                plays: bucket.plays,
                minutes: ms_to_minutes(bucket.ms_played),
                hours: ms_to_hours(bucket.ms_played),
            })
            .collect();

        let year_stats = YearStats {
            total_plays: plays,
            total_minutes,
            total_hours: ms_to_hours(self.total_ms),
            unique_artists: self.artists.len(),
            unique_tracks: self.tracks.len(),
            unique_albums: self.albums.len(),
            unique_days_with_listening: self.days.len(),
            average_track_length_minutes: ratio(total_minutes, plays as f64),
            average_daily_minutes: ratio(total_minutes, self.days.len() as f64),
            rates: self.behavior.rates(),
            first_play: self.first.map(|e| timestamp::format_instant(&e.timestamp)),
            last_play: self.last.map(|e| timestamp::format_instant(&e.timestamp)),
            peak_month: peak.map(|(idx, _)| vocab::month_name(idx as u32 + 1).to_string()),
            peak_month_plays: peak.map_or(0, |(_, p)| p),
            top_platform: self.platforms.top(),
            top_provider: self.providers.top(),
            provider_breakdown: self.providers.to_map(),
            platform_breakdown: self.platforms.to_map(),
            country_breakdown: self.countries.to_map(),
            monthly_breakdown,
        };

        AnnualRecap {
            year,
            top_artists: self.artists.ranked(ANNUAL_TOP_N),
            top_tracks: self.tracks.ranked(ANNUAL_TOP_N),
            top_albums: self.albums.ranked(ANNUAL_TOP_N),
            year_stats,
        }
    }
}

/// Compute one recap per calendar year in the configured range.
///
/// Plays outside `[min_year, max_year]` (which includes every fallback
/// timestamp) are ignored. Years without plays are absent.
pub fn annual_recaps(events: &[PlayEvent], options: &AggregateOptions) -> BTreeMap<i32, AnnualRecap> {
    let mut years: BTreeMap<i32, YearAccumulator<'_>> = BTreeMap::new();
    for event in events {
        if !event.has_known_time() {
            continue;
        }
        let year = event.timestamp.year();
        if !options.includes_year(year) {
            continue;
        }
        years.entry(year).or_default().record(event);
    }

    years
        .into_iter()
        .map(|(year, acc)| (year, acc.finish(year)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Provider, END_REASON_TRACK_DONE};
    use chrono::{TimeZone, Utc};

    fn options() -> AggregateOptions {
        AggregateOptions::new(2008, 2024)
    }

    fn play(y: i32, m: u32, d: u32, artist: &str, track: &str) -> PlayEvent {
        PlayEvent::new(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(), Provider::Spotify)
            .with_artist(artist)
            .with_track(track)
            .with_duration(200_000)
            .with_platform("Android OS 12")
            .with_country("GB")
    }

    #[test]
    fn test_one_play_per_year() {
        let events = vec![play(2020, 6, 1, "X", "Y"), play(2021, 6, 1, "X", "Y")];
        let recaps = annual_recaps(&events, &options());

        assert_eq!(recaps.len(), 2);
        for recap in recaps.values() {
            assert_eq!(recap.year_stats.total_plays, 1);
            assert_eq!(recap.year_stats.unique_artists, 1);
            assert_eq!(recap.top_artists, vec![("X".to_string(), 1)]);
        }
    }

    #[test]
    fn test_years_outside_range_are_skipped() {
        let events = vec![
            play(2007, 12, 31, "Old", "o"),
            play(2008, 1, 1, "Edge", "e"),
            play(2025, 1, 1, "Future", "f"),
            PlayEvent::new(timestamp::fallback_instant(), Provider::AppleMusic),
        ];
        let recaps = annual_recaps(&events, &options());
        assert_eq!(recaps.keys().copied().collect::<Vec<_>>(), vec![2008]);
    }

    #[test]
    fn test_monthly_breakdown_has_twelve_buckets() {
        let events = vec![
            play(2020, 3, 1, "A", "a"),
            play(2020, 3, 2, "A", "b"),
            play(2020, 11, 5, "B", "c"),
        ];
        let stats = annual_recaps(&events, &options())[&2020].year_stats.clone();

        assert_eq!(stats.monthly_breakdown.len(), 12);
        assert_eq!(stats.monthly_breakdown[0].month, "January");
        assert_eq!(stats.monthly_breakdown[0].plays, 0);
        assert_eq!(stats.monthly_breakdown[2].plays, 2);
        assert_eq!(stats.peak_month.as_deref(), Some("March"));
        assert_eq!(stats.peak_month_plays, 2);
        assert_eq!(stats.unique_days_with_listening, 3);
    }

    #[test]
    fn test_peak_month_tie_goes_to_earlier_month() {
        let events = vec![play(2020, 9, 1, "A", "a"), play(2020, 4, 1, "A", "a")];
        let stats = &annual_recaps(&events, &options())[&2020].year_stats;
        assert_eq!(stats.peak_month.as_deref(), Some("April"));
    }

    #[test]
    fn test_rates_and_breakdowns() {
        let events = vec![
            play(2020, 1, 1, "A", "a").with_end_reason(END_REASON_TRACK_DONE),
            play(2020, 1, 2, "A", "a").skipped(true),
        ];
        let stats = &annual_recaps(&events, &options())[&2020].year_stats;
        assert!((stats.rates.skip_rate_percentage - 50.0).abs() < 1e-9);
        assert!((stats.rates.completion_rate_percentage - 50.0).abs() < 1e-9);
        assert_eq!(stats.top_platform, Some(("Android".to_string(), 2)));
        assert_eq!(stats.top_provider, Some(("Spotify".to_string(), 2)));
        assert_eq!(stats.country_breakdown["GB"], 2);
        assert_eq!(stats.first_play.as_deref(), Some("2020-01-01T12:00:00Z"));
        assert_eq!(stats.last_play.as_deref(), Some("2020-01-02T12:00:00Z"));
    }

    #[test]
    fn test_serializes_with_string_year_keys() {
        let events = vec![play(2019, 5, 5, "A", "a")];
        let value = serde_json::to_value(annual_recaps(&events, &options())).unwrap();
        assert_eq!(value["2019"]["year"], 2019);
        assert_eq!(value["2019"]["year_stats"]["skip_rate_percentage"], 0.0);
    }
}
