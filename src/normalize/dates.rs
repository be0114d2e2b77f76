use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::constants::dates::{SECONDS_PER_DAY, SERIAL_EPOCH, SERIAL_MAX, SERIAL_MIN};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%b %d, %Y", "%B %d, %Y"];

/// Parse a date-like JSON value. Returns `None` for anything unparsable.
///
/// Strings may be RFC 3339, ISO date/datetime, or US `MM/DD/YYYY` forms.
/// Numbers (and numeric strings) are read as spreadsheet serial days when they
/// fall inside the plausible serial range.
pub fn parse_event_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Number(number) => number.as_f64().and_then(from_serial_days),
        Value::String(text) => parse_date_str(text),
        _ => None,
    }
}

/// Parse a date string in any of the accepted textual formats.
pub fn parse_date_str(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    trimmed.parse::<f64>().ok().and_then(from_serial_days)
}

/// Convert a spreadsheet serial day count into a timestamp.
fn from_serial_days(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(SERIAL_MIN..=SERIAL_MAX).contains(&serial) {
        return None;
    }
    let (year, month, day) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * SECONDS_PER_DAY).round() as i64;
    epoch.checked_add_signed(Duration::seconds(seconds))
}

/// Signed difference `later - earlier` in fractional days.
pub fn days_between(earlier: NaiveDateTime, later: NaiveDateTime) -> f64 {
    (later - earlier).num_seconds() as f64 / SECONDS_PER_DAY
}

/// Round to one decimal place.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Mean of a set of timestamps, or `None` when empty.
pub fn mean_timestamp(dates: &[NaiveDateTime]) -> Option<NaiveDateTime> {
    let first = *dates.first()?;
    let total: i64 = dates.iter().map(|date| (*date - first).num_seconds()).sum();
    let offset = total / dates.len() as i64;
    first.checked_add_signed(Duration::seconds(offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn parses_supported_string_formats() {
        assert_eq!(parse_date_str("2025-03-04"), Some(ymd(2025, 3, 4)));
        assert_eq!(parse_date_str("03/04/2025"), Some(ymd(2025, 3, 4)));
        assert_eq!(parse_date_str("Mar 4, 2025"), Some(ymd(2025, 3, 4)));
        assert_eq!(
            parse_date_str("2025-03-04T10:30:00Z"),
            ymd(2025, 3, 4).checked_add_signed(Duration::minutes(630))
        );
        assert_eq!(
            parse_date_str("2025-03-04 06:00"),
            ymd(2025, 3, 4).checked_add_signed(Duration::hours(6))
        );
    }

    #[test]
    fn rejects_garbage_without_panicking() {
        assert_eq!(parse_date_str(""), None);
        assert_eq!(parse_date_str("not a date"), None);
        assert_eq!(parse_date_str("2025-13-01"), None);
        assert_eq!(parse_date_str("02/30/2025"), None);
        assert_eq!(parse_event_date(&json!(true)), None);
        assert_eq!(parse_event_date(&json!(12)), None);
    }

    #[test]
    fn parses_serial_days() {
        // 45658 is 2025-01-01 in spreadsheet serial days.
        assert_eq!(parse_event_date(&json!(45658)), Some(ymd(2025, 1, 1)));
        assert_eq!(parse_event_date(&json!("45658")), Some(ymd(2025, 1, 1)));
        assert_eq!(
            parse_event_date(&json!(45658.5)),
            ymd(2025, 1, 1).checked_add_signed(Duration::hours(12))
        );
    }

    #[test]
    fn day_math_helpers() {
        assert_eq!(days_between(ymd(2025, 1, 1), ymd(2025, 1, 11)), 10.0);
        assert_eq!(days_between(ymd(2025, 1, 11), ymd(2025, 1, 1)), -10.0);
        assert_eq!(round_one_decimal(2.449), 2.4);
        assert_eq!(round_one_decimal(2.45001), 2.5);
        assert_eq!(
            mean_timestamp(&[ymd(2025, 1, 1), ymd(2025, 1, 11)]),
            Some(ymd(2025, 1, 6))
        );
        assert_eq!(mean_timestamp(&[]), None);
    }
}
