use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::timestamp;

/// The streaming service a play was exported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Provider {
    /// Extended streaming history JSON export. Supplies the canonical
    /// artist vocabulary.
    Spotify,
    /// "Play History Daily Tracks" CSV export.
    #[serde(rename = "Apple Music")]
    AppleMusic,
}

impl Provider {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spotify => "Spotify",
            Self::AppleMusic => "Apple Music",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// End reason recorded when a track plays to completion.
pub const END_REASON_TRACK_DONE: &str = "trackdone";

/// End reason used when the source did not record one.
pub const END_REASON_UNKNOWN: &str = "unknown";

/// One listening occurrence in the canonical log.
///
/// Built once per raw source record by a normalizer and never mutated
/// afterwards. Non-music items (podcasts, videos, audiobooks) are rejected
/// before a `PlayEvent` is ever constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayEvent {
    /// When the play happened. Unparseable source timestamps are mapped to
    /// [`timestamp::fallback_instant`] rather than dropped.
    #[serde(with = "timestamp::serde_instant", default = "timestamp::fallback_instant")]
    pub timestamp: DateTime<Utc>,

    pub provider: Provider,

    /// Device or OS the play came from, after the provider's own lookup table.
    pub platform: String,

    /// Two-letter country code, or the raw value when no code is known.
    pub country: String,

    pub artist: Option<String>,
    pub track: Option<String>,
    pub album: Option<String>,

    /// Milliseconds actually played.
    pub duration_played: u64,

    pub skipped: bool,
    pub end_reason: String,
    pub shuffle: Option<bool>,
    pub offline: Option<bool>,
    pub incognito: bool,

    /// Originating network address, when the export records one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_addr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_start: Option<String>,
}

impl PlayEvent {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, provider: Provider) -> Self {
        Self {
            timestamp,
            provider,
            platform: String::new(),
            country: String::new(),
            artist: None,
            track: None,
            album: None,
            duration_played: 0,
            skipped: false,
            end_reason: END_REASON_UNKNOWN.to_string(),
            shuffle: None,
            offline: None,
            incognito: false,
            ip_addr: None,
            track_uri: None,
            reason_start: None,
        }
    }

    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    #[must_use]
    pub fn with_track(mut self, track: impl Into<String>) -> Self {
        self.track = Some(track.into());
        self
    }

    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration_played: u64) -> Self {
        self.duration_played = duration_played;
        self
    }

    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    #[must_use]
    pub fn with_end_reason(mut self, end_reason: impl Into<String>) -> Self {
        self.end_reason = end_reason.into();
        self
    }

    #[must_use]
    pub fn with_ip_addr(mut self, ip_addr: impl Into<String>) -> Self {
        self.ip_addr = Some(ip_addr.into());
        self
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = Some(shuffle);
        self
    }

    #[must_use]
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = Some(offline);
        self
    }

    #[must_use]
    pub fn skipped(mut self, skipped: bool) -> Self {
        self.skipped = skipped;
        self
    }

    /// Whether the play ran to the natural end of the track.
    pub fn is_completed(&self) -> bool {
        self.end_reason == END_REASON_TRACK_DONE
    }

    /// Whether the timestamp is a real instant rather than the parse fallback.
    pub fn has_known_time(&self) -> bool {
        !timestamp::is_fallback(&self.timestamp)
    }
}
