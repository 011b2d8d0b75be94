//! Fixed lookup tables mapping provider vocabularies onto the canonical one.
//!
//! Unrecognized values pass through unchanged; a value we have no entry for
//! is still more useful than a rejected record.

use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Apple Music → canonical
// ---------------------------------------------------------------------------

const END_REASONS: &[(&str, &str)] = &[
    ("NATURAL_END_OF_TRACK", "trackdone"),
    ("MANUALLY_SELECTED_PLAYBACK_OF_A_DIFF_ITEM", "fwdbtn"),
    ("PLAYBACK_MANUALLY_PAUSED", "endplay"),
    ("SCRUBBING_BEGIN", "fwdbtn"),
    ("SCRUBBING_END", "endplay"),
];

const PLATFORMS: &[(&str, &str)] = &[
    ("IPHONE", "iOS"),
    ("IPAD", "iOS"),
    ("MACOS", "macOS"),
    ("ITUNES", "Windows"),
    ("APPLE_TV", "tvOS"),
    ("APPLE_WATCH", "watchOS"),
];

const COUNTRIES: &[(&str, &str)] = &[
    ("United States", "US"),
    ("Canada", "CA"),
    ("United Kingdom", "GB"),
    ("Australia", "AU"),
    ("Germany", "DE"),
    ("France", "FR"),
    ("Japan", "JP"),
    ("Brazil", "BR"),
    ("Mexico", "MX"),
    ("Italy", "IT"),
    ("Spain", "ES"),
    ("Netherlands", "NL"),
    ("Sweden", "SE"),
    ("Norway", "NO"),
    ("Denmark", "DK"),
    ("Finland", "FI"),
];

fn lookup<'a>(table: &[(&str, &'a str)], key: &str) -> Option<&'a str> {
    table
        .iter()
        .find(|(from, _)| *from == key)
        .map(|(_, to)| *to)
}

/// Map an Apple Music `End Reason Type` to a Spotify-style `reason_end`.
pub fn map_end_reason(raw: &str) -> String {
    lookup(END_REASONS, raw).unwrap_or(raw).to_string()
}

/// Map an Apple Music `Source Type` to a platform name.
pub fn map_platform(raw: &str) -> String {
    lookup(PLATFORMS, raw).unwrap_or(raw).to_string()
}

/// Map a country name to its two-letter code.
pub fn map_country(raw: &str) -> String {
    lookup(COUNTRIES, raw).unwrap_or(raw).to_string()
}

// ---------------------------------------------------------------------------
// Platform categories
// ---------------------------------------------------------------------------

/// Ordered substring rules; the first rule with a matching needle wins.
const PLATFORM_CATEGORIES: &[(&[&str], &str)] = &[
    (&["ios", "iphone", "ipad"], "iOS"),
    (&["android"], "Android"),
    (&["osx", "macos", "macintosh"], "macOS"),
    (&["windows"], "Windows"),
    (&["web", "websocket"], "Web Player"),
    (&["watch"], "Watch"),
    (&["garmin"], "Garmin"),
    (&["google", "cast"], "Google Cast"),
    (&["partner"], "Partner Device"),
];

/// Collapse a raw platform string into a coarse device category.
///
/// Spotify platform strings are free-form (`"iOS 14.4 (iPhone12,1)"`,
/// `"Partner sonos_one"`), so rollups group them by substring.
pub fn platform_category(raw: &str) -> &'static str {
    if raw.is_empty() {
        return "Unknown";
    }
    let lower = raw.to_lowercase();
    PLATFORM_CATEGORIES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
        .map_or("Other", |(_, category)| *category)
}

// ---------------------------------------------------------------------------
// Calendar helpers
// ---------------------------------------------------------------------------

/// Meteorological season of a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// `month` is 1-based.
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Self::Winter,
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            _ => Self::Fall,
        }
    }

    pub fn of(date: &impl Datelike) -> Self {
        Self::from_month(date.month())
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Winter => "Winter",
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Fall => "Fall",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// English name of a 1-based month; empty for out-of-range input.
pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_NAMES.get(idx as usize))
        .copied()
        .unwrap_or("")
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
