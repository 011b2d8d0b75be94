//! Raw record shapes as they appear in the provider exports.

use serde::{Deserialize, Serialize};

/// One entry of a Spotify extended streaming history file.
///
/// Every field is optional: the exports are inconsistent across years and
/// content types, and a missing field is a filtering decision, not a parse
/// error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyRecord {
    pub ts: Option<String>,
    pub platform: Option<String>,
    pub ms_played: Option<i64>,
    pub conn_country: Option<String>,
    #[serde(alias = "ip_addr_decrypted")]
    pub ip_addr: Option<String>,
    pub master_metadata_track_name: Option<String>,
    pub master_metadata_album_artist_name: Option<String>,
    pub master_metadata_album_album_name: Option<String>,
    pub spotify_track_uri: Option<String>,
    pub episode_name: Option<String>,
    pub episode_show_name: Option<String>,
    pub spotify_episode_uri: Option<String>,
    pub audiobook_title: Option<String>,
    pub audiobook_uri: Option<String>,
    pub audiobook_chapter_uri: Option<String>,
    pub audiobook_chapter_title: Option<String>,
    pub reason_start: Option<String>,
    pub reason_end: Option<String>,
    pub shuffle: Option<bool>,
    pub skipped: Option<bool>,
    pub offline: Option<bool>,
    pub offline_timestamp: Option<i64>,
    pub incognito_mode: Option<bool>,
}

impl SpotifyRecord {
    /// A music play carries a track URI plus track and artist names, and no
    /// podcast or audiobook metadata.
    pub fn is_music(&self) -> bool {
        let has_track = self.spotify_track_uri.is_some()
            && self.master_metadata_track_name.is_some()
            && self.master_metadata_album_artist_name.is_some();
        let is_episode = self.episode_name.is_some() || self.spotify_episode_uri.is_some();
        let is_audiobook = self.audiobook_title.is_some()
            || self.audiobook_uri.is_some()
            || self.audiobook_chapter_uri.is_some()
            || self.audiobook_chapter_title.is_some();

        has_track && !is_episode && !is_audiobook
    }

    /// Milliseconds played, clamped at zero.
    pub fn duration_played(&self) -> u64 {
        self.ms_played.map_or(0, |ms| u64::try_from(ms).unwrap_or(0))
    }
}

/// One row of the Apple Music "Play History Daily Tracks" CSV.
///
/// Kept as raw strings; numeric parsing happens during normalization so a
/// single bad cell only affects its own row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppleMusicRow {
    #[serde(rename = "Track Description")]
    pub track_description: String,
    #[serde(rename = "Media type")]
    pub media_type: String,
    #[serde(rename = "Play Duration Milliseconds")]
    pub play_duration_ms: String,
    #[serde(rename = "Date Played")]
    pub date_played: String,
    #[serde(rename = "Hours")]
    pub hours: String,
    #[serde(rename = "Source Type")]
    pub source_type: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "End Reason Type")]
    pub end_reason_type: String,
    #[serde(rename = "Skip Count")]
    pub skip_count: String,
}

impl AppleMusicRow {
    pub fn play_duration(&self) -> Option<u64> {
        self.play_duration_ms.trim().parse().ok()
    }

    pub fn skip_count(&self) -> u64 {
        self.skip_count.trim().parse().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song() -> SpotifyRecord {
        SpotifyRecord {
            ts: Some("2020-01-01T00:00:00Z".to_string()),
            ms_played: Some(180_000),
            master_metadata_track_name: Some("Song".to_string()),
            master_metadata_album_artist_name: Some("Artist".to_string()),
            spotify_track_uri: Some("spotify:track:abc".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_song_is_music() {
        assert!(song().is_music());
    }

    #[test]
    fn test_episode_is_not_music() {
        let mut record = song();
        record.episode_name = Some("Episode 1".to_string());
        assert!(!record.is_music());
    }

    #[test]
    fn test_audiobook_chapter_is_not_music() {
        let mut record = song();
        record.audiobook_chapter_uri = Some("spotify:chapter:x".to_string());
        assert!(!record.is_music());
    }

    #[test]
    fn test_missing_uri_is_not_music() {
        let mut record = song();
        record.spotify_track_uri = None;
        assert!(!record.is_music());
    }

    #[test]
    fn test_negative_duration_clamps_to_zero() {
        let mut record = song();
        record.ms_played = Some(-5);
        assert_eq!(record.duration_played(), 0);
    }

    #[test]
    fn test_spotify_record_from_json_with_nulls() {
        let json = r#"{
            "ts": "2021-05-01T10:00:00Z",
            "ms_played": 1000,
            "ip_addr_decrypted": "1.2.3.4",
            "episode_name": null,
            "skipped": null
        }"#;
        let record: SpotifyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.ip_addr.as_deref(), Some("1.2.3.4"));
        assert!(record.skipped.is_none());
    }

    #[test]
    fn test_apple_row_numeric_helpers() {
        let row = AppleMusicRow {
            play_duration_ms: " 45000 ".to_string(),
            skip_count: "x".to_string(),
            ..Default::default()
        };
        assert_eq!(row.play_duration(), Some(45_000));
        assert_eq!(row.skip_count(), 0);
    }
}
