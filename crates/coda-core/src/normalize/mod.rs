//! Per-provider normalizers projecting raw export records onto [`PlayEvent`].
//!
//! [`PlayEvent`]: crate::model::PlayEvent

pub mod apple_music;
pub mod spotify;

use serde::{Deserialize, Serialize};

pub use apple_music::{
    parse_track_description, AppleMusicNormalizer, AppleMusicOutput, TrackDescription,
};
pub use spotify::{SpotifyFilter, SpotifyNormalizer, SpotifyOutput};

/// Skipped plays shorter than this are not counted as listening.
pub const MIN_LISTEN_MS: u64 = 30_000;

/// Record counts gathered while normalizing one provider's export.
///
/// Used for logging and stage metadata only; nothing downstream depends on
/// these numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeReport {
    /// Records read from the export, including malformed ones.
    pub total: u64,
    /// Records that could not be decoded at all.
    pub malformed: u64,
    /// Records that passed the content-type check.
    pub music_only: u64,
    /// Records dropped by any rule other than the year cutoff.
    pub excluded: u64,
    pub excluded_by_cutoff: u64,
    /// Records kept.
    pub kept: u64,
    /// Kept records whose timestamp could not be parsed.
    pub fallback_timestamps: u64,
}
