// Utility helpers for parsing, matching and formatting.
//
// This module centralizes all the "dirty" text/date handling so the
// aggregator and views can assume typed values or a clean `None`.
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Date-time layouts seen in inspection exports, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parse an inspection date while tolerating the usual export variants.
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Understands floating timestamps (`2020-03-04T00:00:00.000`), RFC 3339
///   with an offset, and plain dates (which map to midnight).
/// - Returns `None` for anything else instead of failing.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Case-insensitive substring test used for all result/category matching.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// `part / whole` as a percentage rounded to one decimal; 0 for an empty whole.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}

pub fn round1(n: f64) -> f64 {
    (n * 10.0).round() / 10.0
}

/// `M/D/YYYY`, or `"N/A"` when the date is missing or unreadable.
pub fn format_us_date(s: Option<&str>) -> String {
    match parse_date_safe(s) {
        Some(dt) => dt.format("%-m/%-d/%Y").to_string(),
        None => "N/A".to_string(),
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals with locale-aware thousands separators, e.g. `1,234.5`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = parts.next() {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Used for counts in console messages (e.g., `9,855 records loaded`).
    n.to_formatted_string(&Locale::en)
}

/// Minimal HTML escaping for text and attribute positions.
pub fn escape_html<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_date_variants() {
        let dt = parse_date_safe(Some("2020-03-04T13:45:00.000")).unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour()), (2020, 3, 4, 13));

        let dt = parse_date_safe(Some("2021-11-30")).unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour()), (2021, 11, 30, 0));

        assert!(parse_date_safe(Some("2022-01-05T08:00:00Z")).is_some());
        assert!(parse_date_safe(Some("07/04/2019")).is_some());
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date_safe(None), None);
        assert_eq!(parse_date_safe(Some("  ")), None);
        assert_eq!(parse_date_safe(Some("not a date")), None);
        assert_eq!(parse_date_safe(Some("2020-13-45")), None);
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(2, 3), 66.7);
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(percent(4, 4), 100.0);
    }

    #[test]
    fn test_format_us_date() {
        assert_eq!(format_us_date(Some("2020-03-04T00:00:00.000")), "3/4/2020");
        assert_eq!(format_us_date(Some("bogus")), "N/A");
        assert_eq!(format_us_date(None), "N/A");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(66.66, 1), "66.7");
        assert_eq!(format_number(-12.0, 0), "-12");
        assert_eq!(format_int(9855), "9,855");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom & Jerry's"</b>"#),
            "&lt;b&gt;&quot;Tom &amp; Jerry&#39;s&quot;&lt;/b&gt;"
        );
    }
}
