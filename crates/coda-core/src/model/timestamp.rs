//! Timestamp normalization.
//!
//! Both providers encode time differently: Spotify uses ISO-8601 strings with
//! a literal `Z`, Apple Music records a `YYYYMMDD` date plus a list of hour
//! buckets. Every parser here is total: input that cannot be understood maps
//! to [`fallback_instant`] so that sorting and date-range logic never have to
//! deal with a missing time.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// The instant assigned to records whose timestamp cannot be parsed.
///
/// `0001-01-01T00:00:00Z`, so fallback records sort before every real play.
pub fn fallback_instant() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Whether `instant` is the parse fallback rather than a real play time.
pub fn is_fallback(instant: &DateTime<Utc>) -> bool {
    *instant == fallback_instant()
}

/// Parse an ISO-8601 timestamp, with or without fractional seconds.
///
/// Strings with a `Z` or numeric offset are converted to UTC; strings with
/// no zone designator are taken to already be UTC.
pub fn parse_iso(raw: &str) -> DateTime<Utc> {
    let raw = raw.trim();
    if raw.is_empty() {
        return fallback_instant();
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc);
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map_or_else(fallback_instant, |naive| naive.and_utc())
}

/// Build a timestamp from an Apple Music `Date Played` / `Hours` pair.
///
/// The export records hour buckets rather than exact minutes, so the result
/// is truncated to the hour. When several hours are listed (`"16, 18"`) the
/// first one is used; an unusable hour falls back to midnight of the date.
pub fn parse_date_hour(date_played: &str, hours: &str) -> DateTime<Utc> {
    let Some(date) = parse_compact_date(date_played) else {
        return fallback_instant();
    };

    let hour = hours
        .split(',')
        .next()
        .map(str::trim)
        .and_then(|h| h.parse::<u32>().ok());

    hour.and_then(|h| date.and_hms_opt(h, 0, 0))
        .or_else(|| date.and_hms_opt(0, 0, 0))
        .map_or_else(fallback_instant, |naive| naive.and_utc())
}

/// Parse the leading `YYYYMMDD` of a date string.
fn parse_compact_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let digits = raw.get(0..8)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let year = digits.get(0..4)?.parse().ok()?;
    let month = digits.get(4..6)?.parse().ok()?;
    let day = digits.get(6..8)?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Render an instant the way the exports do: second precision (fractional
/// digits only when present) and a literal `Z`.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// `#[serde(with = ...)]` adapter that writes [`format_instant`] and reads
/// through [`parse_iso`], so a stored log with a bad timestamp still loads.
pub mod serde_instant {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        instant: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_instant(instant))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .map_or_else(super::fallback_instant, super::parse_iso))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    #[test]
    fn test_parse_iso_with_z() {
        let ts = parse_iso("2023-01-01T12:00:00Z");
        assert_eq!(ts, Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_iso_with_fraction() {
        let ts = parse_iso("2023-01-01T12:00:00.250Z");
        assert_eq!(ts.timestamp_subsec_millis(), 250);
        assert_eq!(ts.second(), 0);
    }

    #[test]
    fn test_parse_iso_with_offset_converts_to_utc() {
        let ts = parse_iso("2023-01-01T12:00:00+02:00");
        assert_eq!(ts.hour(), 10);
    }

    #[test]
    fn test_parse_iso_without_zone() {
        let ts = parse_iso("2019-07-04T08:30:00");
        assert_eq!(ts, Utc.with_ymd_and_hms(2019, 7, 4, 8, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_iso_garbage_falls_back() {
        assert!(is_fallback(&parse_iso("")));
        assert!(is_fallback(&parse_iso("not a date")));
        assert!(is_fallback(&parse_iso("2023-13-45T00:00:00Z")));
    }

    #[test]
    fn test_fallback_sorts_first() {
        let real = parse_iso("1970-01-01T00:00:00Z");
        assert!(fallback_instant() < real);
        assert_eq!(fallback_instant().year(), 1);
    }

    #[test]
    fn test_parse_date_hour_single_hour() {
        let ts = parse_date_hour("20230115", "16");
        assert_eq!(ts, Utc.with_ymd_and_hms(2023, 1, 15, 16, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_date_hour_takes_first_of_many() {
        let ts = parse_date_hour("20230115", "16, 18");
        assert_eq!(ts.hour(), 16);
    }

    #[test]
    fn test_parse_date_hour_bad_hour_uses_midnight() {
        let ts = parse_date_hour("20230115", "");
        assert_eq!(ts, Utc.with_ymd_and_hms(2023, 1, 15, 0, 0, 0).unwrap());

        let ts = parse_date_hour("20230115", "25");
        assert_eq!(ts.hour(), 0);
        assert_eq!(ts.day(), 15);
    }

    #[test]
    fn test_parse_date_hour_bad_date_falls_back() {
        assert!(is_fallback(&parse_date_hour("2023011", "10")));
        assert!(is_fallback(&parse_date_hour("2023AB15", "10")));
        assert!(is_fallback(&parse_date_hour("20230230", "10")));
        assert!(is_fallback(&parse_date_hour("", "")));
    }

    #[test]
    fn test_format_instant_round_trips() {
        let ts = Utc.with_ymd_and_hms(2020, 2, 29, 23, 59, 59).unwrap();
        let text = format_instant(&ts);
        assert_eq!(text, "2020-02-29T23:59:59Z");
        assert_eq!(parse_iso(&text), ts);
        assert_eq!(format_instant(&fallback_instant()), "0001-01-01T00:00:00Z");
    }
}
