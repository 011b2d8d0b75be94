//! Spotify extended streaming history → canonical events.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::model::{timestamp, PlayEvent, Provider, SpotifyRecord, END_REASON_UNKNOWN};
use crate::normalize::{NormalizeReport, MIN_LISTEN_MS};

/// Filtering options for the Spotify export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotifyFilter {
    /// Plays from before this calendar year are dropped.
    pub cutoff_year: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct SpotifyOutput {
    pub events: Vec<PlayEvent>,
    pub report: NormalizeReport,
}

/// Why a record did not make it into the canonical log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    NotMusic,
    Incognito,
    ShortSkip,
    BeforeCutoff,
}

/// Applies the Spotify exclusion rules and converts survivors.
///
/// Rules are checked in a fixed order and the first one that fires decides,
/// so a record is counted against exactly one rule.
#[derive(Debug, Clone, Default)]
pub struct SpotifyNormalizer {
    filter: SpotifyFilter,
}

impl SpotifyNormalizer {
    pub fn new(filter: SpotifyFilter) -> Self {
        Self { filter }
    }

    /// Normalize already-decoded records.
    pub fn normalize<I>(&self, records: I) -> SpotifyOutput
    where
        I: IntoIterator<Item = SpotifyRecord>,
    {
        let mut output = SpotifyOutput::default();
        for record in records {
            self.push(record, &mut output);
        }
        log_summary(&output.report);
        output
    }

    /// Normalize loosely-typed JSON records, counting the ones that do not
    /// decode as a Spotify record instead of failing the whole file.
    pub fn normalize_values<I>(&self, values: I) -> SpotifyOutput
    where
        I: IntoIterator<Item = serde_json::Value>,
    {
        let mut output = SpotifyOutput::default();
        for value in values {
            match serde_json::from_value::<SpotifyRecord>(value) {
                Ok(record) => self.push(record, &mut output),
                Err(e) => {
                    log::debug!("Skipping malformed Spotify record: {e}");
                    output.report.total += 1;
                    output.report.malformed += 1;
                }
            }
        }
        log_summary(&output.report);
        output
    }

    fn push(&self, record: SpotifyRecord, output: &mut SpotifyOutput) {
        let report = &mut output.report;
        report.total += 1;

        match self.accept(record) {
            Ok(event) => {
                report.music_only += 1;
                report.kept += 1;
                if !event.has_known_time() {
                    report.fallback_timestamps += 1;
                }
                output.events.push(event);
            }
            Err(Rejection::NotMusic) => report.excluded += 1,
            Err(Rejection::Incognito | Rejection::ShortSkip) => {
                report.music_only += 1;
                report.excluded += 1;
            }
            Err(Rejection::BeforeCutoff) => {
                report.music_only += 1;
                report.excluded_by_cutoff += 1;
            }
        }
    }

    fn accept(&self, record: SpotifyRecord) -> Result<PlayEvent, Rejection> {
        if !record.is_music() {
            return Err(Rejection::NotMusic);
        }
        if record.incognito_mode == Some(true) {
            return Err(Rejection::Incognito);
        }
        if record.skipped == Some(true) && record.duration_played() < MIN_LISTEN_MS {
            return Err(Rejection::ShortSkip);
        }

        let event = to_event(record);
        if let Some(cutoff) = self.filter.cutoff_year {
            if event.timestamp.year() < cutoff {
                return Err(Rejection::BeforeCutoff);
            }
        }
        Ok(event)
    }
}

fn log_summary(report: &NormalizeReport) {
    log::info!(
        "Spotify: {} records, {} music, {} excluded, {} before cutoff, {} malformed, {} kept",
        report.total,
        report.music_only,
        report.excluded,
        report.excluded_by_cutoff,
        report.malformed,
        report.kept
    );
    if report.fallback_timestamps > 0 {
        log::warn!(
            "Spotify: {} kept records have unparseable timestamps",
            report.fallback_timestamps
        );
    }
}

/// Project a Spotify record onto the canonical shape. The field vocabulary
/// already matches, so values are carried over as-is.
pub fn to_event(record: SpotifyRecord) -> PlayEvent {
    let timestamp = record
        .ts
        .as_deref()
        .map_or_else(timestamp::fallback_instant, timestamp::parse_iso);
    let duration_played = record.duration_played();

    PlayEvent {
        timestamp,
        provider: Provider::Spotify,
        platform: record.platform.unwrap_or_default(),
        country: record.conn_country.unwrap_or_default(),
        artist: record.master_metadata_album_artist_name,
        track: record.master_metadata_track_name,
        album: record.master_metadata_album_album_name,
        duration_played,
        skipped: record.skipped.unwrap_or(false),
        end_reason: record
            .reason_end
            .filter(|reason| !reason.is_empty())
            .unwrap_or_else(|| END_REASON_UNKNOWN.to_string()),
        shuffle: record.shuffle,
        offline: record.offline,
        incognito: record.incognito_mode.unwrap_or(false),
        ip_addr: record.ip_addr,
        track_uri: record.spotify_track_uri,
        reason_start: record.reason_start,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn song(ts: &str) -> SpotifyRecord {
        SpotifyRecord {
            ts: Some(ts.to_string()),
            platform: Some("iOS 14.4 (iPhone12,1)".to_string()),
            ms_played: Some(200_000),
            conn_country: Some("US".to_string()),
            master_metadata_track_name: Some("Y".to_string()),
            master_metadata_album_artist_name: Some("X".to_string()),
            master_metadata_album_album_name: Some("Z".to_string()),
            spotify_track_uri: Some("spotify:track:1".to_string()),
            reason_end: Some("trackdone".to_string()),
            skipped: Some(false),
            ..Default::default()
        }
    }

    #[test]
    fn test_music_record_becomes_event() {
        let output = SpotifyNormalizer::default().normalize([song("2020-06-01T12:00:00Z")]);
        assert_eq!(output.events.len(), 1);

        let event = &output.events[0];
        assert_eq!(event.provider, Provider::Spotify);
        assert_eq!(event.artist.as_deref(), Some("X"));
        assert_eq!(event.platform, "iOS 14.4 (iPhone12,1)");
        assert_eq!(event.duration_played, 200_000);
        assert!(event.is_completed());
        assert_eq!(output.report.kept, 1);
    }

    #[test]
    fn test_podcast_is_excluded() {
        let mut record = song("2020-06-01T12:00:00Z");
        record.episode_show_name = Some("Show".to_string());
        record.episode_name = Some("Ep".to_string());

        let output = SpotifyNormalizer::default().normalize([record]);
        assert!(output.events.is_empty());
        assert_eq!(output.report.excluded, 1);
        assert_eq!(output.report.music_only, 0);
    }

    #[test]
    fn test_incognito_is_excluded() {
        let mut record = song("2020-06-01T12:00:00Z");
        record.incognito_mode = Some(true);
        let output = SpotifyNormalizer::default().normalize([record]);
        assert!(output.events.is_empty());
        assert_eq!(output.report.music_only, 1);
        assert_eq!(output.report.excluded, 1);
    }

    #[test]
    fn test_skip_boundary_is_thirty_seconds() {
        let mut short = song("2020-06-01T12:00:00Z");
        short.skipped = Some(true);
        short.ms_played = Some(29_999);

        let mut enough = short.clone();
        enough.ms_played = Some(30_000);

        let output = SpotifyNormalizer::default().normalize([short, enough]);
        assert_eq!(output.events.len(), 1);
        assert_eq!(output.events[0].duration_played, 30_000);
        assert!(output.events[0].skipped);
    }

    #[test]
    fn test_short_unskipped_play_is_kept() {
        let mut record = song("2020-06-01T12:00:00Z");
        record.ms_played = Some(1_000);
        let output = SpotifyNormalizer::default().normalize([record]);
        assert_eq!(output.events.len(), 1);
    }

    #[test]
    fn test_cutoff_year() {
        let normalizer = SpotifyNormalizer::new(SpotifyFilter {
            cutoff_year: Some(2020),
        });
        let output = normalizer.normalize([
            song("2019-12-31T23:59:59Z"),
            song("2020-01-01T00:00:00Z"),
        ]);
        assert_eq!(output.events.len(), 1);
        assert_eq!(output.report.excluded_by_cutoff, 1);
    }

    #[test]
    fn test_record_matching_two_rules_is_counted_once() {
        let mut record = song("2010-01-01T00:00:00Z");
        record.incognito_mode = Some(true);

        let normalizer = SpotifyNormalizer::new(SpotifyFilter {
            cutoff_year: Some(2015),
        });
        let output = normalizer.normalize([record]);
        assert!(output.events.is_empty());
        assert_eq!(output.report.excluded + output.report.excluded_by_cutoff, 1);
    }

    #[test]
    fn test_bad_timestamp_kept_with_fallback() {
        let output = SpotifyNormalizer::default().normalize([song("yesterday")]);
        assert_eq!(output.events.len(), 1);
        assert!(!output.events[0].has_known_time());
        assert_eq!(output.report.fallback_timestamps, 1);
    }

    #[test]
    fn test_missing_reason_end_is_unknown() {
        let mut record = song("2020-06-01T12:00:00Z");
        record.reason_end = None;
        let output = SpotifyNormalizer::default().normalize([record]);
        assert_eq!(output.events[0].end_reason, END_REASON_UNKNOWN);
    }

    #[test]
    fn test_malformed_values_are_counted() {
        let values = vec![
            serde_json::to_value(song("2020-06-01T12:00:00Z")).unwrap(),
            json!("not an object"),
            json!({ "ms_played": "lots" }),
        ];
        let output = SpotifyNormalizer::default().normalize_values(values);
        assert_eq!(output.events.len(), 1);
        assert_eq!(output.report.total, 3);
        assert_eq!(output.report.malformed, 2);
    }
}
