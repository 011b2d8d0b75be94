//! Per-artist summaries with a nested per-year breakdown.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::{timestamp, PlayEvent};
use crate::stats::common::{
    label_or_unknown, ms_to_hours, ms_to_minutes, ratio, BehaviorCounts, Rates, Tally,
    UNKNOWN_LABEL,
};
use crate::stats::AggregateOptions;
use crate::vocab;

/// Length of each artist's top track/album lists.
pub const ARTIST_TOP_N: usize = 20;
const ARTIST_TOP_COUNTRIES_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistSummary {
    pub total_streams: u64,
    pub total_minutes: f64,
    pub total_hours: f64,
    pub unique_tracks: usize,
    pub unique_albums: usize,
    pub years_active: usize,
    pub days_active: usize,
    pub first_played: Option<String>,
    pub last_played: Option<String>,
    pub avg_track_length_minutes: f64,
    pub avg_streams_per_year: f64,
    pub avg_minutes_per_year: f64,
    pub avg_streams_per_day: f64,
    pub avg_minutes_per_day: f64,
    #[serde(flatten)]
    pub rates: Rates,
    pub peak_year: Option<i32>,
    pub peak_year_streams: u64,
    pub top_tracks: Vec<(String, u64)>,
    pub top_albums: Vec<(String, u64)>,
    pub top_platform: String,
    pub top_provider: String,
    pub countries_streamed_from: usize,
    pub top_countries: Vec<(String, u64)>,
    pub platform_breakdown: BTreeMap<String, u64>,
    pub provider_breakdown: BTreeMap<String, u64>,
    pub yearly_breakdown: BTreeMap<i32, ArtistYear>,
}

/// One artist's activity within one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistYear {
    pub streams: u64,
    pub minutes: f64,
    pub hours: f64,
    pub unique_tracks: usize,
    pub unique_albums: usize,
    pub top_platform: String,
    pub top_provider: String,
    #[serde(flatten)]
    pub rates: Rates,
    pub first_play: Option<String>,
    pub last_play: Option<String>,
    pub platform_breakdown: BTreeMap<String, u64>,
    pub provider_breakdown: BTreeMap<String, u64>,
}

/// Counters shared by the artist total and each of its years.
#[derive(Default)]
struct Activity<'a> {
    total_ms: u64,
    tracks: Tally,
    albums: Tally,
    platforms: Tally,
    providers: Tally,
    behavior: BehaviorCounts,
    first: Option<&'a PlayEvent>,
    last: Option<&'a PlayEvent>,
}

impl<'a> Activity<'a> {
    fn record(&mut self, event: &'a PlayEvent) {
        self.total_ms += event.duration_played;
        self.behavior.record(event);
        if let Some(track) = &event.track {
            self.tracks.add(track.clone());
        }
        if let Some(album) = &event.album {
            self.albums.add(album.clone());
        }
        self.platforms
            .add(vocab::platform_category(&event.platform).to_string());
        self.providers.add(event.provider.to_string());

        let ts = event.timestamp;
        if self.first.map_or(true, |f| ts < f.timestamp) {
            self.first = Some(event);
        }
        if self.last.map_or(true, |l| ts >= l.timestamp) {
            self.last = Some(event);
        }
    }

    fn top_platform(&self) -> String {
        self.platforms
            .top()
            .map_or_else(|| UNKNOWN_LABEL.to_string(), |(name, _)| name)
    }

    fn top_provider(&self) -> String {
        self.providers
            .top()
            .map_or_else(|| UNKNOWN_LABEL.to_string(), |(name, _)| name)
    }

    fn first_play(&self) -> Option<String> {
        self.first.map(|e| timestamp::format_instant(&e.timestamp))
    }

    fn last_play(&self) -> Option<String> {
        self.last.map(|e| timestamp::format_instant(&e.timestamp))
    }
}

#[derive(Default)]
struct ArtistAccumulator<'a> {
    overall: Activity<'a>,
    countries: Tally,
    days: BTreeSet<NaiveDate>,
    years: BTreeMap<i32, Activity<'a>>,
}

impl<'a> ArtistAccumulator<'a> {
    fn record(&mut self, event: &'a PlayEvent) {
        let ts = event.timestamp;
        self.overall.record(event);
        self.countries
            .add(label_or_unknown(&event.country).to_string());
        self.days.insert(ts.date_naive());
        self.years.entry(ts.year()).or_default().record(event);
    }

    fn finish(self) -> ArtistSummary {
        let overall = &self.overall;
        let streams = overall.behavior.plays;
        let total_minutes = ms_to_minutes(overall.total_ms);
        let years_active = self.years.len() as f64;
        let days_active = self.days.len() as f64;

        // Busiest year; the earliest year wins a tie.
        let mut peak: Option<(i32, u64)> = None;
        for (year, activity) in &self.years {
            if peak.map_or(true, |(_, p)| activity.behavior.plays > p) {
                peak = Some((*year, activity.behavior.plays));
            }
        }

        let yearly_breakdown = self
            .years
            .iter()
            .map(|(year, activity)| {
                let entry = ArtistYear {
                    streams: activity.behavior.plays,
                    minutes: ms_to_minutes(activity.total_ms),
                    hours: ms_to_hours(activity.total_ms),
                    unique_tracks: activity.tracks.len(),
                    unique_albums: activity.albums.len(),
                    top_platform: activity.top_platform(),
                    top_provider: activity.top_provider(),
                    rates: activity.behavior.rates(),
                    first_play: activity.first_play(),
                    last_play: activity.last_play(),
                    platform_breakdown: activity.platforms.to_map(),
                    provider_breakdown: activity.providers.to_map(),
                };
                (*year, entry)
            })
            .collect();

        ArtistSummary {
            total_streams: streams,
            total_minutes,
            total_hours: ms_to_hours(overall.total_ms),
            unique_tracks: overall.tracks.len(),
            unique_albums: overall.albums.len(),
            years_active: self.years.len(),
            days_active: self.days.len(),
            first_played: overall.first_play(),
            last_played: overall.last_play(),
            avg_track_length_minutes: ratio(total_minutes, streams as f64),
            avg_streams_per_year: ratio(streams as f64, years_active),
            avg_minutes_per_year: ratio(total_minutes, years_active),
            avg_streams_per_day: ratio(streams as f64, days_active),
            avg_minutes_per_day: ratio(total_minutes, days_active),
            rates: overall.behavior.rates(),
            peak_year: peak.map(|(year, _)| year),
            peak_year_streams: peak.map_or(0, |(_, p)| p),
            top_tracks: overall.tracks.ranked(ARTIST_TOP_N),
            top_albums: overall.albums.ranked(ARTIST_TOP_N),
            top_platform: overall.top_platform(),
            top_provider: overall.top_provider(),
            countries_streamed_from: self.countries.len(),
            top_countries: self.countries.ranked(ARTIST_TOP_COUNTRIES_N),
            platform_breakdown: overall.platforms.to_map(),
            provider_breakdown: overall.providers.to_map(),
            yearly_breakdown,
        }
    }
}

/// Compute one summary per artist over plays in the configured year range.
///
/// Plays without an artist, with a fallback timestamp, or outside
/// `[min_year, max_year]` are ignored.
pub fn artist_summaries(
    events: &[PlayEvent],
    options: &AggregateOptions,
) -> BTreeMap<String, ArtistSummary> {
    let mut artists: BTreeMap<&str, ArtistAccumulator<'_>> = BTreeMap::new();
    for event in events {
        let Some(artist) = event.artist.as_deref() else {
            continue;
        };
        if !event.has_known_time() || !options.includes_year(event.timestamp.year()) {
            continue;
        }
        artists.entry(artist).or_default().record(event);
    }

    artists
        .into_iter()
        .map(|(artist, acc)| (artist.to_string(), acc.finish()))
        .collect()
}
