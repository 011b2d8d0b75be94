//! Apple Music play history CSV → canonical events.
//!
//! Apple Music rows carry artist and song in one free-text "Track
//! Description" column, so every artist spelling goes through the identity
//! resolver against the Spotify vocabulary before it reaches the log.

use std::collections::HashMap;
use std::io::Read;

use crate::error::Result;
use crate::model::{
    timestamp, AppleMusicRow, ArtistMapping, MappingReportEntry, PlayEvent, Provider,
    END_REASON_UNKNOWN,
};
use crate::normalize::{NormalizeReport, MIN_LISTEN_MS};
use crate::resolve::{self, IdentityResolver, MatchingOptions};
use crate::vocab;

/// Separator between artist and song in a track description.
const DESCRIPTION_SEPARATOR: &str = " - ";

/// Artist and song parsed out of a track description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDescription {
    pub artist: Option<String>,
    pub song: String,
}

/// Split `"Artist - Song"` on the first separator.
///
/// Without a separator the whole description is the song. Returns `None`
/// when no song title can be recovered, including for purely numeric
/// descriptions, which the export uses for unnamed items.
pub fn parse_track_description(raw: &str) -> Option<TrackDescription> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    // Split before trimming so a separator at either edge still counts.
    let (artist, song) = match raw.split_once(DESCRIPTION_SEPARATOR) {
        Some((artist, song)) => (Some(artist.trim()), song.trim()),
        None => (None, trimmed),
    };
    if song.is_empty() {
        return None;
    }

    Some(TrackDescription {
        artist: artist.filter(|a| !a.is_empty()).map(str::to_string),
        song: song.to_string(),
    })
}

#[derive(Debug, Clone, Default)]
pub struct AppleMusicOutput {
    pub events: Vec<PlayEvent>,
    /// One mapping per kept row that named an artist, in row order.
    pub mappings: Vec<ArtistMapping>,
    pub report: NormalizeReport,
}

impl AppleMusicOutput {
    /// One entry per distinct source artist, most frequent first.
    pub fn mapping_report(&self) -> Vec<MappingReportEntry> {
        resolve::mapping_report(&self.mappings)
    }

    pub fn matched_artists(&self) -> usize {
        self.mapping_report().iter().filter(|e| e.was_matched).count()
    }
}

/// A row that passed the exclusion rules, waiting for artist resolution.
struct Candidate {
    row: AppleMusicRow,
    description: TrackDescription,
    duration: u64,
}

#[derive(Debug, Clone, Default)]
pub struct AppleMusicNormalizer {
    matching: MatchingOptions,
}

impl AppleMusicNormalizer {
    pub fn new(matching: MatchingOptions) -> Self {
        Self { matching }
    }

    /// Decode CSV rows from `reader` and normalize them. Rows that fail to
    /// decode are counted as malformed; an unreadable header is an error.
    pub fn normalize_reader<R: Read>(
        &self,
        reader: R,
        canonical: &[PlayEvent],
    ) -> Result<AppleMusicOutput> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        csv_reader.headers()?;

        let mut rows = Vec::new();
        let mut malformed = 0;
        for row in csv_reader.deserialize::<AppleMusicRow>() {
            match row {
                Ok(row) => rows.push(row),
                Err(e) => {
                    log::debug!("Skipping malformed Apple Music row: {e}");
                    malformed += 1;
                }
            }
        }

        let mut output = self.normalize(rows, canonical);
        output.report.total += malformed;
        output.report.malformed = malformed;
        Ok(output)
    }

    /// Normalize decoded rows, resolving artists against the names in the
    /// `canonical` (Spotify) events.
    pub fn normalize<I>(&self, rows: I, canonical: &[PlayEvent]) -> AppleMusicOutput
    where
        I: IntoIterator<Item = AppleMusicRow>,
    {
        let mut report = NormalizeReport::default();
        let mut candidates = Vec::new();

        for row in rows {
            report.total += 1;
            if !row.media_type.trim().eq_ignore_ascii_case("audio") {
                report.excluded += 1;
                continue;
            }
            report.music_only += 1;

            let duration = row.play_duration().filter(|ms| *ms >= MIN_LISTEN_MS);
            let description = parse_track_description(&row.track_description);
            match (duration, description) {
                (Some(duration), Some(description)) => candidates.push(Candidate {
                    row,
                    description,
                    duration,
                }),
                _ => report.excluded += 1,
            }
        }

        let eligible = resolve::top_artists_by_duration(
            candidates
                .iter()
                .filter_map(|c| c.description.artist.as_deref().map(|a| (a, c.duration))),
            self.matching.top_k,
        );
        let resolver =
            IdentityResolver::new(resolve::target_vocabulary(canonical), eligible, self.matching);
        log::debug!(
            "Resolving Apple Music artists against {} Spotify artists",
            resolver.target_count()
        );

        let mut cache: HashMap<String, ArtistMapping> = HashMap::new();
        let mut events = Vec::with_capacity(candidates.len());
        let mut mappings = Vec::new();

        for candidate in candidates {
            let mapping = candidate.description.artist.as_deref().map(|artist| {
                cache
                    .entry(artist.to_string())
                    .or_insert_with(|| resolver.resolve(artist))
                    .clone()
            });

            let event = to_event(&candidate, mapping.as_ref());
            if !event.has_known_time() {
                report.fallback_timestamps += 1;
            }
            events.push(event);
            mappings.extend(mapping);
        }
        report.kept = events.len() as u64;

        let output = AppleMusicOutput {
            events,
            mappings,
            report,
        };
        log::info!(
            "Apple Music: {} rows, {} audio, {} excluded, {} kept, {} of {} artists matched",
            report.total,
            report.music_only,
            report.excluded,
            report.kept,
            output.matched_artists(),
            cache.len()
        );
        if report.fallback_timestamps > 0 {
            log::warn!(
                "Apple Music: {} kept rows have unparseable dates",
                report.fallback_timestamps
            );
        }
        output
    }
}

fn to_event(candidate: &Candidate, mapping: Option<&ArtistMapping>) -> PlayEvent {
    let row = &candidate.row;
    let end_reason = match row.end_reason_type.trim() {
        "" => END_REASON_UNKNOWN.to_string(),
        raw => vocab::map_end_reason(raw),
    };

    let mut event = PlayEvent::new(
        timestamp::parse_date_hour(&row.date_played, &row.hours),
        Provider::AppleMusic,
    )
    .with_track(candidate.description.song.clone())
    .with_duration(candidate.duration)
    .with_platform(vocab::map_platform(row.source_type.trim()))
    .with_country(vocab::map_country(row.country.trim()))
    .with_end_reason(end_reason)
    .skipped(row.skip_count() > 0);

    event.artist = mapping
        .map(|m| m.resolved_name.clone())
        .or_else(|| candidate.description.artist.clone());
    event
}
