//! Whole-history rollup.

use chrono::{Datelike, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{timestamp, PlayEvent, Provider};
use crate::stats::common::{
    bump, busiest, label_or_unknown, ms_to_minutes, percentage, ratio, BehaviorCounts, PlayTime,
    Rates, Tally, MS_PER_HOUR,
};
use crate::vocab::{self, Season};

/// Length of the lifetime top artist/track/album lists.
pub const LIFETIME_TOP_N: usize = 50;
const TOP_COUNTRIES_N: usize = 10;
const DAYS_PER_MONTH: f64 = 30.44;
const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifetimeStats {
    pub metadata: Metadata,
    pub time_stats: TimeStats,
    pub content_stats: ContentStats,
    pub platform_stats: PlatformStats,
    pub provider_stats: ProviderStats,
    pub geographical_stats: GeographicalStats,
    pub listening_behavior: ListeningBehavior,
    pub temporal_patterns: TemporalPatterns,
    pub diversity_metrics: DiversityMetrics,
    pub top_lists: TopLists,
    pub milestones: Milestones,
    pub technical_stats: TechnicalStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub total_records: u64,
    /// Providers present in the corpus.
    pub data_sources: Vec<String>,
    /// Records whose timestamp is the parse fallback. They count towards
    /// totals but not towards any time bucket.
    pub fallback_timestamps: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeStats {
    pub total_milliseconds: u64,
    pub total_seconds: f64,
    pub total_minutes: f64,
    pub total_hours: f64,
    pub total_days: f64,
    pub total_weeks: f64,
    pub total_months: f64,
    pub total_years: f64,
    pub average_track_length_ms: f64,
    pub average_track_length_seconds: f64,
    pub average_track_length_minutes: f64,
    pub earliest_play: Option<String>,
    pub latest_play: Option<String>,
    pub tracking_span_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentStats {
    pub unique_artists: usize,
    pub unique_tracks: usize,
    pub unique_albums: usize,
    pub total_plays: u64,
    pub average_plays_per_artist: f64,
    pub average_plays_per_track: f64,
    pub average_plays_per_album: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformStats {
    /// Plays per platform category.
    pub distribution: BTreeMap<String, u64>,
    pub total_platforms: usize,
    pub top_platform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStats {
    pub distribution: BTreeMap<String, u64>,
    pub total_providers: usize,
    pub spotify_percentage: f64,
    pub apple_music_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographicalStats {
    pub countries_streamed_from: usize,
    pub top_countries: Vec<(String, u64)>,
    pub distribution: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListeningBehavior {
    #[serde(flatten)]
    pub rates: Rates,
    pub total_skips: u64,
    pub total_completions: u64,
    pub total_offline_plays: u64,
    pub total_shuffle_plays: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalPatterns {
    pub yearly_breakdown: BTreeMap<i32, PlayTime>,
    /// Keyed `YYYY-MM`.
    pub monthly_breakdown: BTreeMap<String, PlayTime>,
    /// Keyed `YYYY-MM-DD`.
    pub daily_breakdown: BTreeMap<String, PlayTime>,
    pub hourly_breakdown: BTreeMap<u32, PlayTime>,
    pub weekday_breakdown: BTreeMap<String, PlayTime>,
    pub seasonal_breakdown: BTreeMap<Season, PlayTime>,
    pub peak_listening_hour: Option<u32>,
    pub peak_listening_day: Option<String>,
    pub peak_listening_season: Option<Season>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiversityMetrics {
    /// Distinct artists per play; higher is more varied.
    pub artist_diversity_score: f64,
    pub unique_artists: usize,
    pub unique_tracks: usize,
    /// Share of all plays going to the top 1, 5 and 10 artists. When fewer
    /// artists exist, every available artist is counted.
    pub top_1_artist_concentration: f64,
    pub top_5_artist_concentration: f64,
    pub top_10_artist_concentration: f64,
    pub plays_per_artist: f64,
    pub plays_per_track: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopLists {
    pub top_artists: Vec<(String, u64)>,
    pub top_tracks: Vec<(String, u64)>,
    pub top_albums: Vec<(String, u64)>,
    pub top_platforms: Vec<(String, u64)>,
    pub top_countries: Vec<(String, u64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub timestamp: Option<String>,
    pub artist: Option<String>,
    pub track: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongestPlay {
    pub timestamp: String,
    pub provider: Provider,
    pub artist: Option<String>,
    pub track: Option<String>,
    pub duration_played: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestones {
    pub first_track_played: Milestone,
    pub most_recent_track: Milestone,
    pub longest_track_played: Option<LongestPlay>,
    pub days_with_listening: usize,
    pub average_daily_listening_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    pub records_with_timestamps: u64,
    pub records_with_artists: u64,
    pub records_with_tracks: u64,
    pub records_with_duration: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalStats {
    pub data_quality: DataQuality,
    pub average_daily_tracks: f64,
    pub tracks_per_hour_of_listening: f64,
}

// ---------------------------------------------------------------------------
// Accumulation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Accumulator<'a> {
    total_ms: u64,
    providers: Tally,
    platforms: Tally,
    countries: Tally,
    artists: Tally,
    tracks: Tally,
    albums: Tally,
    behavior: BehaviorCounts,
    quality_artists: u64,
    quality_tracks: u64,
    quality_duration: u64,
    fallback: u64,

    yearly: BTreeMap<i32, PlayTime>,
    monthly: BTreeMap<String, PlayTime>,
    daily: BTreeMap<NaiveDate, PlayTime>,
    hourly: BTreeMap<u32, PlayTime>,
    weekday: BTreeMap<String, PlayTime>,
    seasonal: BTreeMap<Season, PlayTime>,

    first: Option<&'a PlayEvent>,
    last: Option<&'a PlayEvent>,
    longest: Option<&'a PlayEvent>,
}

impl<'a> Accumulator<'a> {
    fn record(&mut self, event: &'a PlayEvent) {
        let duration = event.duration_played;
        self.total_ms += duration;
        self.behavior.record(event);

        self.providers.add(event.provider.to_string());
        self.platforms
            .add(vocab::platform_category(&event.platform).to_string());
        self.countries
            .add(label_or_unknown(&event.country).to_string());

        if let Some(artist) = &event.artist {
            self.artists.add(artist.clone());
            self.quality_artists += 1;
        }
        if let Some(track) = &event.track {
            self.tracks.add(track.clone());
            self.quality_tracks += 1;
        }
        if let Some(album) = &event.album {
            self.albums.add(album.clone());
        }
        if duration > 0 {
            self.quality_duration += 1;
        }
        if self.longest.map_or(true, |l| duration > l.duration_played) {
            self.longest = Some(event);
        }

        if !event.has_known_time() {
            self.fallback += 1;
            return;
        }

        let ts = event.timestamp;
        if self.first.map_or(true, |f| ts < f.timestamp) {
            self.first = Some(event);
        }
        if self.last.map_or(true, |l| ts >= l.timestamp) {
            self.last = Some(event);
        }

        bump(&mut self.yearly, ts.year(), duration);
        bump(
            &mut self.monthly,
            format!("{:04}-{:02}", ts.year(), ts.month()),
            duration,
        );
        bump(&mut self.daily, ts.date_naive(), duration);
        bump(&mut self.hourly, ts.hour(), duration);
        bump(
            &mut self.weekday,
            vocab::weekday_name(ts.weekday()).to_string(),
            duration,
        );
        bump(&mut self.seasonal, Season::of(&ts), duration);
    }
}

fn milestone(event: Option<&PlayEvent>) -> Milestone {
    Milestone {
        timestamp: event.map(|e| timestamp::format_instant(&e.timestamp)),
        artist: event.and_then(|e| e.artist.clone()),
        track: event.and_then(|e| e.track.clone()),
    }
}

fn span_days(first: Option<&PlayEvent>, last: Option<&PlayEvent>) -> Option<i64> {
    Some((last?.timestamp - first?.timestamp).num_days())
}

/// Compute the lifetime rollup over a consolidated corpus.
///
/// Pure function of `events`: the same corpus always produces the same
/// value (and the same serialized bytes).
pub fn lifetime_stats(events: &[PlayEvent]) -> LifetimeStats {
    let mut acc = Accumulator::default();
    for event in events {
        acc.record(event);
    }

    let total_records = events.len() as u64;
    let plays = total_records as f64;
    let total_ms = acc.total_ms;
    let total_seconds = total_ms as f64 / 1000.0;
    let total_minutes = ms_to_minutes(total_ms);
    let total_hours = total_ms as f64 / MS_PER_HOUR;
    let total_days = total_hours / 24.0;
    let span = span_days(acc.first, acc.last);
    let listening_days = acc.daily.len();

    let time_stats = TimeStats {
        total_milliseconds: total_ms,
        total_seconds,
        total_minutes,
        total_hours,
        total_days,
        total_weeks: total_days / 7.0,
        total_months: total_days / DAYS_PER_MONTH,
        total_years: total_days / DAYS_PER_YEAR,
        average_track_length_ms: ratio(total_ms as f64, plays),
        average_track_length_seconds: ratio(total_seconds, plays),
        average_track_length_minutes: ratio(total_minutes, plays),
        earliest_play: acc.first.map(|e| timestamp::format_instant(&e.timestamp)),
        latest_play: acc.last.map(|e| timestamp::format_instant(&e.timestamp)),
        tracking_span_days: span.unwrap_or(0),
    };

    let content_stats = ContentStats {
        unique_artists: acc.artists.len(),
        unique_tracks: acc.tracks.len(),
        unique_albums: acc.albums.len(),
        total_plays: total_records,
        average_plays_per_artist: ratio(plays, acc.artists.len() as f64),
        average_plays_per_track: ratio(plays, acc.tracks.len() as f64),
        average_plays_per_album: ratio(plays, acc.albums.len() as f64),
    };

    let platform_stats = PlatformStats {
        distribution: acc.platforms.to_map(),
        total_platforms: acc.platforms.len(),
        top_platform: acc.platforms.top().map(|(name, _)| name),
    };

    let provider_stats = ProviderStats {
        distribution: acc.providers.to_map(),
        total_providers: acc.providers.len(),
        spotify_percentage: percentage(
            acc.providers.get(&Provider::Spotify.to_string()),
            total_records,
        ),
        apple_music_percentage: percentage(
            acc.providers.get(&Provider::AppleMusic.to_string()),
            total_records,
        ),
    };

    let geographical_stats = GeographicalStats {
        countries_streamed_from: acc.countries.len(),
        top_countries: acc.countries.ranked(TOP_COUNTRIES_N),
        distribution: acc.countries.to_map(),
    };

    let listening_behavior = ListeningBehavior {
        rates: acc.behavior.rates(),
        total_skips: acc.behavior.skipped,
        total_completions: acc.behavior.completed,
        total_offline_plays: acc.behavior.offline,
        total_shuffle_plays: acc.behavior.shuffled,
    };

    let temporal_patterns = TemporalPatterns {
        peak_listening_hour: busiest(&acc.hourly).map(|(hour, _)| hour),
        peak_listening_day: busiest(&acc.weekday).map(|(day, _)| day),
        peak_listening_season: busiest(&acc.seasonal).map(|(season, _)| season),
        yearly_breakdown: acc.yearly,
        monthly_breakdown: acc.monthly,
        daily_breakdown: acc
            .daily
            .iter()
            .map(|(date, bucket)| (date.format("%Y-%m-%d").to_string(), *bucket))
            .collect(),
        hourly_breakdown: acc.hourly,
        weekday_breakdown: acc.weekday,
        seasonal_breakdown: acc.seasonal,
    };

    let diversity_metrics = DiversityMetrics {
        artist_diversity_score: ratio(acc.artists.len() as f64, plays),
        unique_artists: acc.artists.len(),
        unique_tracks: acc.tracks.len(),
        top_1_artist_concentration: percentage(acc.artists.top_n_total(1), total_records),
        top_5_artist_concentration: percentage(acc.artists.top_n_total(5), total_records),
        top_10_artist_concentration: percentage(acc.artists.top_n_total(10), total_records),
        plays_per_artist: ratio(plays, acc.artists.len() as f64),
        plays_per_track: ratio(plays, acc.tracks.len() as f64),
    };

    let top_lists = TopLists {
        top_artists: acc.artists.ranked(LIFETIME_TOP_N),
        top_tracks: acc.tracks.ranked(LIFETIME_TOP_N),
        top_albums: acc.albums.ranked(LIFETIME_TOP_N),
        top_platforms: acc.platforms.ranked(usize::MAX),
        top_countries: acc.countries.ranked(usize::MAX),
    };

    let milestones = Milestones {
        first_track_played: milestone(acc.first),
        most_recent_track: milestone(acc.last),
        longest_track_played: acc.longest.map(|e| LongestPlay {
            timestamp: timestamp::format_instant(&e.timestamp),
            provider: e.provider,
            artist: e.artist.clone(),
            track: e.track.clone(),
            duration_played: e.duration_played,
        }),
        days_with_listening: listening_days,
        average_daily_listening_minutes: ratio(total_minutes, listening_days as f64),
    };

    let technical_stats = TechnicalStats {
        data_quality: DataQuality {
            records_with_timestamps: total_records - acc.fallback,
            records_with_artists: acc.quality_artists,
            records_with_tracks: acc.quality_tracks,
            records_with_duration: acc.quality_duration,
        },
        average_daily_tracks: span.map_or(0.0, |days| ratio(plays, (days + 1) as f64)),
        tracks_per_hour_of_listening: ratio(plays, total_hours),
    };

    LifetimeStats {
        metadata: Metadata {
            total_records,
            data_sources: acc.providers.to_map().into_keys().collect(),
            fallback_timestamps: acc.fallback,
        },
        time_stats,
        content_stats,
        platform_stats,
        provider_stats,
        geographical_stats,
        listening_behavior,
        temporal_patterns,
        diversity_metrics,
        top_lists,
        milestones,
        technical_stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn play(y: i32, m: u32, d: u32, h: u32, artist: &str, track: &str) -> PlayEvent {
        PlayEvent::new(Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap(), Provider::Spotify)
            .with_artist(artist)
            .with_track(track)
            .with_album("Album")
            .with_duration(200_000)
            .with_platform("iOS 15.0 (iPhone13,2)")
            .with_country("US")
    }

    #[test]
    fn test_two_plays_one_artist() {
        let events = vec![
            play(2020, 6, 1, 10, "X", "Y"),
            play(2021, 6, 1, 10, "X", "Y"),
        ];
        let stats = lifetime_stats(&events);
        assert_eq!(stats.content_stats.total_plays, 2);
        assert_eq!(stats.content_stats.unique_artists, 1);
        assert_eq!(stats.time_stats.total_milliseconds, 400_000);
        assert_eq!(stats.temporal_patterns.yearly_breakdown[&2020].plays, 1);
        assert_eq!(stats.temporal_patterns.yearly_breakdown[&2021].plays, 1);
        assert_eq!(stats.time_stats.tracking_span_days, 365);
    }

    #[test]
    fn test_empty_corpus() {
        let stats = lifetime_stats(&[]);
        assert_eq!(stats.content_stats.total_plays, 0);
        assert!(stats.platform_stats.top_platform.is_none());
        assert!(stats.milestones.longest_track_played.is_none());
        assert!(stats.time_stats.earliest_play.is_none());
        assert!(stats.diversity_metrics.top_1_artist_concentration.abs() < f64::EPSILON);
    }

    #[test]
    fn test_temporal_buckets_and_season() {
        // 2021-01-04 is a Monday.
        let events = vec![
            play(2021, 1, 4, 22, "A", "a"),
            play(2021, 1, 4, 22, "A", "b"),
            play(2021, 7, 4, 9, "B", "c"),
        ];
        let patterns = lifetime_stats(&events).temporal_patterns;
        assert_eq!(patterns.peak_listening_hour, Some(22));
        assert_eq!(patterns.peak_listening_day.as_deref(), Some("Monday"));
        assert_eq!(patterns.peak_listening_season, Some(Season::Winter));
        assert_eq!(patterns.monthly_breakdown["2021-01"].plays, 2);
        assert_eq!(patterns.daily_breakdown["2021-07-04"].ms_played, 200_000);
        assert_eq!(patterns.seasonal_breakdown[&Season::Summer].plays, 1);
    }

    #[test]
    fn test_fallback_records_are_counted_not_bucketed() {
        let broken = PlayEvent::new(timestamp::fallback_instant(), Provider::AppleMusic)
            .with_artist("A")
            .with_duration(1_000);
        let events = vec![broken, play(2022, 3, 1, 8, "A", "a")];
        let stats = lifetime_stats(&events);

        assert_eq!(stats.metadata.fallback_timestamps, 1);
        assert_eq!(stats.content_stats.total_plays, 2);
        assert_eq!(stats.temporal_patterns.yearly_breakdown.len(), 1);
        assert_eq!(
            stats.milestones.first_track_played.timestamp.as_deref(),
            Some("2022-03-01T08:00:00Z")
        );
        assert_eq!(stats.technical_stats.data_quality.records_with_timestamps, 1);
        assert_eq!(stats.geographical_stats.distribution["Unknown"], 1);
        assert_eq!(stats.metadata.data_sources, vec!["Apple Music", "Spotify"]);
    }

    #[test]
    fn test_concentration_uses_available_artists() {
        let events = vec![
            play(2021, 1, 1, 1, "A", "a"),
            play(2021, 1, 1, 2, "A", "a"),
            play(2021, 1, 1, 3, "B", "b"),
            play(2021, 1, 1, 4, "C", "c"),
        ];
        let diversity = lifetime_stats(&events).diversity_metrics;
        assert!((diversity.top_1_artist_concentration - 50.0).abs() < 1e-9);
        assert!((diversity.top_5_artist_concentration - 100.0).abs() < 1e-9);
        assert!((diversity.artist_diversity_score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_milestones() {
        let mut long = play(2021, 5, 1, 1, "Long", "Epic");
        long.duration_played = 1_200_000;
        let events = vec![
            play(2021, 1, 1, 1, "First", "f"),
            long,
            play(2021, 12, 31, 23, "Last", "l"),
        ];
        let milestones = lifetime_stats(&events).milestones;
        assert_eq!(milestones.first_track_played.artist.as_deref(), Some("First"));
        assert_eq!(milestones.most_recent_track.artist.as_deref(), Some("Last"));
        let longest = milestones.longest_track_played.unwrap();
        assert_eq!(longest.track.as_deref(), Some("Epic"));
        assert_eq!(milestones.days_with_listening, 3);
    }

    #[test]
    fn test_platform_categories() {
        let events = vec![
            play(2021, 1, 1, 1, "A", "a"),
            play(2021, 1, 1, 2, "A", "a").with_platform("Windows 10"),
            play(2021, 1, 1, 3, "A", "a").with_platform("Windows 10"),
        ];
        let stats = lifetime_stats(&events);
        assert_eq!(stats.platform_stats.top_platform.as_deref(), Some("Windows"));
        assert_eq!(stats.platform_stats.distribution["iOS"], 1);
    }

    #[test]
    fn test_output_is_reproducible() {
        let events = vec![
            play(2019, 2, 3, 4, "B", "x"),
            play(2020, 5, 6, 7, "A", "y"),
            play(2020, 5, 6, 8, "C", "y"),
        ];
        let first = serde_json::to_string(&lifetime_stats(&events)).unwrap();
        let second = serde_json::to_string(&lifetime_stats(&events)).unwrap();
        assert_eq!(first, second);
    }
}
