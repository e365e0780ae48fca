// Utility helpers for timestamp parsing, basic statistics and number
// formatting.
//
// The loader and renderers lean on these so the rest of the code can assume
// typed values.
use crate::types::Timestamp;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use num_format::{Locale, ToFormattedString};

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

const NAIVE_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a textual date-time, keeping the offset it was written with.
///
/// - Offset-carrying forms (RFC 3339, `+hh:mm`, `+hhmm`, `Z`) keep their offset.
/// - Naive forms are taken as wall-clock time at a zero offset; nothing is
///   converted, so month/weekday/hour read back exactly as written.
/// - A bare `YYYY-MM-DD` means midnight.
/// - Returns `None` for anything else.
pub fn parse_timestamp(s: &str) -> Option<Timestamp> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts);
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    let utc = FixedOffset::east_opt(0)?;
    utc.from_local_datetime(&naive).single()
}

pub fn minutes_between(start: &Timestamp, end: &Timestamp) -> f64 {
    // Subtraction is on absolute instants; the sign is preserved.
    let elapsed = end.signed_duration_since(*start);
    match elapsed.num_microseconds() {
        Some(us) => us as f64 / 60_000_000.0,
        None => elapsed.num_seconds() as f64 / 60.0,
    }
}

pub fn average(v: &[f64]) -> f64 {
    // Arithmetic mean; 0 for an empty slice to avoid NaN.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals with locale-aware thousands separators (`1,234.5`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_naive_keeps_wall_clock() {
        let ts = parse_timestamp("2023-03-06 08:15:30").unwrap();
        assert_eq!(ts.hour(), 8);
        assert_eq!(ts.minute(), 15);
        assert_eq!(ts.day(), 6);
        assert_eq!(ts.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_parse_fractional_and_t_separator() {
        let a = parse_timestamp("2023-03-06 08:15:30.250").unwrap();
        let b = parse_timestamp("2023-03-06T08:15:30").unwrap();
        assert_eq!(a.second(), 30);
        assert_eq!(a.nanosecond(), 250_000_000);
        assert_eq!(b.hour(), 8);
    }

    #[test]
    fn test_parse_offset_is_preserved() {
        let ts = parse_timestamp("2023-03-06T23:30:00-05:00").unwrap();
        // Still late on the 6th in its own zone; not shifted to UTC.
        assert_eq!(ts.day(), 6);
        assert_eq!(ts.hour(), 23);
        assert_eq!(ts.offset().local_minus_utc(), -5 * 3600);

        let spaced = parse_timestamp("2023-03-06 23:30:00+02:00").unwrap();
        assert_eq!(spaced.hour(), 23);
        assert_eq!(spaced.offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn test_parse_other_forms() {
        assert_eq!(parse_timestamp("2023-03-06T08:15:00Z").unwrap().hour(), 8);
        assert_eq!(parse_timestamp("03/06/2023 17:05").unwrap().hour(), 17);
        let midnight = parse_timestamp("2023-03-06").unwrap();
        assert_eq!((midnight.hour(), midnight.minute()), (0, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2023-13-40 99:00:00").is_none());
    }

    #[test]
    fn test_minutes_between_signed() {
        let a = parse_timestamp("2023-03-06 08:00:00").unwrap();
        let b = parse_timestamp("2023-03-06 08:30:30").unwrap();
        assert_eq!(minutes_between(&a, &b), 30.5);
        assert_eq!(minutes_between(&b, &a), -30.5);
    }

    #[test]
    fn test_minutes_between_across_offsets() {
        let a = parse_timestamp("2023-03-06T08:00:00+00:00").unwrap();
        let b = parse_timestamp("2023-03-06T10:10:00+02:00").unwrap();
        assert_eq!(minutes_between(&a, &b), 10.0);
    }

    #[test]
    fn test_average() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[1.0, 2.0, 6.0]), 3.0);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-12.34, 1), "-12.3");
        assert_eq!(format_number(-0.01, 1), "0.0");
        assert_eq!(format_number(7.0, 0), "7");
    }

    #[test]
    fn test_format_int() {
        assert_eq!(format_int(5_719_877u64), "5,719,877");
        assert_eq!(format_int(0usize), "0");
    }
}
