//! Date and number formatting shared by all screens

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use std::borrow::Cow;
use unicode_width::UnicodeWidthChar;

/// Returns true when `date_str` is `YYYY-MM-DD` and names a real calendar day.
pub fn is_valid_date_format(date_str: &str) -> bool {
    let bytes = date_str.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_ok {
        return false;
    }
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").is_ok()
}

/// Parse an ISO-8601 timestamp (with offset) into UTC.
#[inline]
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// UTC calendar day of a timestamp, or of a bare `YYYY-MM-DD` string.
pub fn utc_day(ts: &str) -> Option<NaiveDate> {
    parse_timestamp(ts)
        .map(|dt| dt.date_naive())
        .or_else(|| NaiveDate::parse_from_str(ts, "%Y-%m-%d").ok())
}

/// "2026-01-27" or "2026-01-27T10:00:00Z" -> "Jan 27, 2026"
pub fn format_date(date_str: &str) -> String {
    match utc_day(date_str) {
        Some(d) => d.format("%b %-d, %Y").to_string(),
        None => date_str.to_string(),
    }
}

/// Local wall-clock rendering of a timestamp.
pub fn format_datetime(ts: &str) -> String {
    match parse_timestamp(ts) {
        Some(dt) => dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ts.to_string(),
    }
}

/// Axis label for a timeline bucket: "1/27" for day/week, "2026/1" for month.
pub fn format_period_label(period_start: &str, monthly: bool) -> String {
    let Some(d) = utc_day(period_start) else {
        return period_start.chars().take(10).collect();
    };
    if monthly {
        format!("{}/{}", d.year(), d.month())
    } else {
        format!("{}/{}", d.month(), d.day())
    }
}

/// Compact rendering used in narrow columns: 1234 -> "1.2K".
#[inline]
pub fn format_number(value: u64) -> String {
    if value >= 1_000_000_000 {
        format!("{:.1}B", value as f64 / 1_000_000_000.0)
    } else if value >= 1_000_000 {
        format!("{:.1}M", value as f64 / 1_000_000.0)
    } else if value >= 1_000 {
        let k = value / 1_000;
        let remainder = value % 1_000;
        format!("{}.{}K", k, remainder / 100)
    } else {
        value.to_string()
    }
}

/// Thousands-separated rendering: 1234567 -> "1,234,567".
#[inline]
pub fn format_number_full(value: u64) -> String {
    let s = value.to_string();
    let len = s.len();

    if len <= 3 {
        return s;
    }

    let mut result = String::with_capacity(len + (len - 1) / 3);
    for (i, ch) in s.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result
}

/// 0.25 -> "25.0%"
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Truncate to `max_width` terminal columns without breaking UTF-8 (no ellipsis).
pub fn safe_truncate_plain(s: &str, max_width: usize) -> Cow<'_, str> {
    let mut width = 0;
    for (idx, ch) in s.char_indices() {
        width += ch.width().unwrap_or(0);
        if width > max_width {
            return Cow::Owned(s[..idx].to_string());
        }
    }
    Cow::Borrowed(s)
}

/// Truncate to `max_width` terminal columns, ending with '…' when cut.
pub fn truncate_with_ellipsis(s: &str, max_width: usize) -> String {
    let cut = safe_truncate_plain(s, max_width);
    if cut.len() == s.len() {
        return s.to_string();
    }
    let shorter = safe_truncate_plain(s, max_width.saturating_sub(1));
    let mut result = String::with_capacity(shorter.len() + 3);
    result.push_str(&shorter);
    result.push('…');
    result
}

/// First 8 chars of a session id, as shown in lists.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_date_format() {
        assert!(is_valid_date_format("2026-01-27"));
        assert!(is_valid_date_format("2024-02-29"));
    }

    #[test]
    fn test_invalid_date_format() {
        assert!(!is_valid_date_format("invalid-date"));
        assert!(!is_valid_date_format("2026-1-27"));
        assert!(!is_valid_date_format("2026-01-27T00:00:00Z"));
        assert!(!is_valid_date_format("2026-13-01"));
        assert!(!is_valid_date_format("2025-02-29"));
        assert!(!is_valid_date_format("２０２６-01-27"));
        assert!(!is_valid_date_format(""));
    }

    #[test]
    fn test_utc_day_uses_utc() {
        let d = utc_day("2026-01-28T01:30:00+09:00").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 1, 27).unwrap());
        assert_eq!(
            utc_day("2026-01-28"),
            NaiveDate::from_ymd_opt(2026, 1, 28)
        );
        assert_eq!(utc_day("yesterday"), None);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2026-01-27"), "Jan 27, 2026");
        assert_eq!(format_date("garbage"), "garbage");
    }

    #[test]
    fn test_period_label() {
        assert_eq!(format_period_label("2026-01-05T00:00:00Z", false), "1/5");
        assert_eq!(format_period_label("2026-01-01T00:00:00Z", true), "2026/1");
    }

    #[test]
    fn test_format_numbers() {
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_234), "1.2K");
        assert_eq!(format_number(2_500_000), "2.5M");
        assert_eq!(format_number_full(0), "0");
        assert_eq!(format_number_full(1_234_567), "1,234,567");
        assert_eq!(format_percent(0.25), "25.0%");
        assert_eq!(format_percent(0.0), "0.0%");
    }

    #[test]
    fn test_truncation() {
        assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
        assert_eq!(truncate_with_ellipsis("hello world", 6), "hello…");
        assert_eq!(safe_truncate_plain("日本語テキスト", 6), "日本語");
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }
}
