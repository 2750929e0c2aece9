//! Timestamp parsing for the formats the crawler backend emits.
//!
//! Stored articles come back as naive wall-clock strings
//! (`2022-12-19 14:31:33`, sometimes with fractional seconds), while freshly
//! crawled ones may still carry the source API's RFC 3339 form
//! (`2021-01-03T15:31:12+09:00`). Both are reduced to [`NaiveDateTime`],
//! keeping the wall-clock time of whatever offset the string carried.

use chrono::{DateTime, NaiveDateTime};

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parses a backend timestamp, returning `None` when no known format fits.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Formats a timestamp the way the catalog table displays it.
#[must_use]
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(DISPLAY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_naive_format() {
        let ts = parse_timestamp("2022-12-19 14:31:33").unwrap();
        assert_eq!(format_timestamp(ts), "2022-12-19 14:31:33");
    }

    #[test]
    fn parses_fractional_seconds() {
        let ts = parse_timestamp("2022-12-19 14:31:33.123456789").unwrap();
        assert_eq!(format_timestamp(ts), "2022-12-19 14:31:33");
    }

    #[test]
    fn rfc3339_keeps_wall_clock_of_its_offset() {
        let ts = parse_timestamp("2021-01-03T15:31:12+09:00").unwrap();
        assert_eq!(format_timestamp(ts), "2021-01-03 15:31:12");
    }

    #[test]
    fn parses_t_separated_naive_format() {
        assert!(parse_timestamp("2020-06-10T01:34:37").is_some());
    }

    #[test]
    fn rejects_garbage_and_empty_strings() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2022-13-40 99:99:99").is_none());
    }
}
