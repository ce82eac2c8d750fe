//! Value formatting and comparison helpers shared by both engines.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;

/// Stands in for a null or blank value in counters and messages.
pub const NULL_SENTINEL: &str = "(null)";

/// Stands in for an empty (but present) value in failure messages.
pub const EMPTY_SENTINEL: &str = "(empty)";

/// The fixed `yyyy-MM-dd HH:mm` layout used by date/time rules.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Returns `true` for `None`, the empty string, or whitespace only.
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Key under which a value is counted: blank values collapse to [`NULL_SENTINEL`].
pub fn null_safe(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => NULL_SENTINEL.to_string(),
    }
}

/// Renders a value for a failure message, making null and empty visible.
pub fn wrap(value: Option<&str>) -> String {
    match value {
        None => NULL_SENTINEL.to_string(),
        Some("") => EMPTY_SENTINEL.to_string(),
        Some(v) => v.to_string(),
    }
}

/// Drops every character that is not a letter or a digit.
pub fn strip_non_alphanumeric(s: &str) -> String {
    s.chars().filter(|c| c.is_alphanumeric()).collect()
}

pub fn equals_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn ends_with_ignore_case(value: &str, suffix: &str) -> bool {
    value.to_lowercase().ends_with(&suffix.to_lowercase())
}

/// Default comparison: punctuation and whitespace are ignored, case is ignored.
///
/// A missing value never matches.
pub fn default_string_compare(value: Option<&str>, expected: &str) -> bool {
    match value {
        None => false,
        Some(v) => equals_ignore_case(
            &strip_non_alphanumeric(v),
            &strip_non_alphanumeric(expected),
        ),
    }
}

/// Parses a value in the fixed [`DATE_TIME_FORMAT`] layout.
///
/// Every field must be zero-padded: `2024-01-01 00:00` parses, `2024-1-1 0:0` does not.
pub fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    let padded = value.len() == 16
        && value.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            10 => b == b' ',
            13 => b == b':',
            _ => b.is_ascii_digit(),
        });
    if !padded {
        return None;
    }
    NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT).ok()
}

/// Whether `pattern` is a chrono format string without unknown specifiers.
pub fn is_valid_date_time_pattern(pattern: &str) -> bool {
    StrftimeItems::new(pattern).all(|item| !matches!(item, Item::Error))
}

/// Formats `value` with a chrono pattern, or `None` if the pattern cannot format it.
pub fn format_date_time(value: NaiveDateTime, pattern: &str) -> Option<String> {
    if !is_valid_date_time_pattern(pattern) {
        return None;
    }
    let mut out = String::new();
    write!(out, "{}", value.format(pattern)).ok()?;
    Some(out)
}

/// Percentage of `part` in `total`, two decimals; `0.00` when `total` is zero.
pub fn format_percent(part: u64, total: u64) -> String {
    let pct = if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    };
    format!("{pct:.2}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection() {
        assert!(is_blank(None));
        assert!(is_blank(Some("")));
        assert!(is_blank(Some("  \t")));
        assert!(!is_blank(Some("K1ABC")));
    }

    #[test]
    fn null_safe_uses_sentinel() {
        assert_eq!(null_safe(None), "(null)");
        assert_eq!(null_safe(Some("   ")), "(null)");
        assert_eq!(null_safe(Some("K1ABC")), "K1ABC");
    }

    #[test]
    fn wrap_distinguishes_null_and_empty() {
        assert_eq!(wrap(None), "(null)");
        assert_eq!(wrap(Some("")), "(empty)");
        assert_eq!(wrap(Some("x")), "x");
    }

    #[test]
    fn default_compare_strips_punctuation() {
        assert!(default_string_compare(Some("O'Brien-1"), "OBrien1"));
        assert!(default_string_compare(Some("k1abc"), "K1ABC"));
        assert!(default_string_compare(Some(" N 5 "), "n5"));
        assert!(!default_string_compare(None, "x"));
        assert!(!default_string_compare(Some("K1ABD"), "K1ABC"));
    }

    #[test]
    fn case_insensitive_helpers() {
        assert!(contains_ignore_case("Shelter Open", "OPEN"));
        assert!(ends_with_ignore_case("report.KML", ".kml"));
        assert!(!ends_with_ignore_case("report.kml", ".html"));
    }

    #[test]
    fn date_time_parsing() {
        assert!(parse_date_time("2024-01-01 00:00").is_some());
        assert!(parse_date_time(" 2024-12-31 23:59 ").is_some());
        assert!(parse_date_time("2024-13-01 00:00").is_none());
        assert!(parse_date_time("garbage").is_none());
        assert!(parse_date_time("2024-01-01").is_none());
    }

    #[test]
    fn date_time_requires_padded_fields() {
        assert!(parse_date_time("2024-1-1 0:0").is_none());
        assert!(parse_date_time("2024-01-01 0:00").is_none());
        assert!(parse_date_time("12024-1-01 00:00").is_none());
        assert!(parse_date_time("2024-01-01T00:00").is_none());
    }

    #[test]
    fn date_time_formatting_rejects_bad_patterns() {
        let value = parse_date_time("2024-06-22 18:05").unwrap();
        assert_eq!(format_date_time(value, DATE_TIME_FORMAT).unwrap(), "2024-06-22 18:05");
        assert_eq!(format_date_time(value, "%d/%m %H%M").unwrap(), "22/06 1805");
        assert!(!is_valid_date_time_pattern("%Y-%Q"));
        assert_eq!(format_date_time(value, "%Y-%Q"), None);
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(format_percent(1, 4), "25.00%");
        assert_eq!(format_percent(0, 0), "0.00%");
        assert_eq!(format_percent(2, 3), "66.67%");
    }
}
