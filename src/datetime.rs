//! Date/time helpers shared by the stores and the views.
//!
//! Every timestamp is persisted as UTC text in `YYYY-MM-DD HH:MM:SS` form, so
//! SQL string comparison on these columns is chronological comparison.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Storage format for timestamp columns.
pub const DB_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Display format used on HTML pages.
pub const DISPLAY_FORMAT: &str = "%d %b %Y at %H:%M";

/// Render a UTC instant in the storage format.
pub fn to_db(dt: &DateTime<Utc>) -> String {
    dt.format(DB_FORMAT).to_string()
}

/// Parse a stored timestamp back into a UTC instant.
pub fn parse_db(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, DB_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Format a stored timestamp for humans in the given timezone.
///
/// Falls back to UTC for an unknown timezone and to the raw string when the
/// timestamp does not parse.
pub fn format_for_display(stored: &str, timezone: &str) -> String {
    let Some(utc) = parse_db(stored) else {
        return stored.to_string();
    };
    match timezone.parse::<Tz>() {
        Ok(tz) => utc.with_timezone(&tz).format(DISPLAY_FORMAT).to_string(),
        Err(_) => utc.format(DISPLAY_FORMAT).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_to_db() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 5).unwrap();
        assert_eq!(to_db(&dt), "2024-01-15 10:30:05");
    }

    #[test]
    fn test_parse_db() {
        let dt = parse_db("2024-01-15 10:30:05").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 5).unwrap());
        assert!(parse_db("yesterday").is_none());
    }

    #[test]
    fn test_storage_order_is_chronological() {
        let early = Utc.with_ymd_and_hms(2024, 9, 30, 23, 59, 59).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap();
        assert!(to_db(&early) < to_db(&late));
    }

    #[test]
    fn test_format_for_display_utc() {
        assert_eq!(
            format_for_display("2024-01-15 10:30:00", "UTC"),
            "15 Jan 2024 at 10:30"
        );
    }

    #[test]
    fn test_format_for_display_timezone() {
        assert_eq!(
            format_for_display("2024-01-15 10:30:00", "Asia/Tokyo"),
            "15 Jan 2024 at 19:30"
        );
    }

    #[test]
    fn test_format_for_display_invalid_timezone() {
        assert_eq!(
            format_for_display("2024-01-15 10:30:00", "Invalid/Zone"),
            "15 Jan 2024 at 10:30"
        );
    }

    #[test]
    fn test_format_for_display_invalid_datetime() {
        assert_eq!(format_for_display("not a date", "UTC"), "not a date");
    }
}
