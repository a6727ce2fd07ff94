//! Absolute timestamp and relative duration parsing.
//!
//! Tracker pages render the same column either as `YYYY-MM-DD HH:MM:SS` or as a
//! countdown / "time ago" string such as `2天3小时`. The helpers here accept
//! both forms and always produce a Unix timestamp.

use std::sync::LazyLock;

use chrono::{FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};
use regex::Regex;

use crate::app::{PtoolError, Result};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date and time glued together without a separator, e.g. `2023-08-0109:30:00`.
static CONCATENATED_DATETIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}[0-9]{2}:[0-9]{2}:[0-9]{2}$").unwrap());

/// CJK calendar units and their duration suffix. Longer tokens come first so
/// `小时` is consumed before `时` and `分钟` before `分`.
const UNIT_TOKENS: &[(&str, &str)] = &[
    ("周", "w"),
    ("週", "w"),
    ("天", "d"),
    ("日", "d"),
    ("小时", "h"),
    ("小時", "h"),
    ("时", "h"),
    ("時", "h"),
    ("分种", "m"),
    ("分钟", "m"),
    ("分鐘", "m"),
    ("分", "m"),
    ("秒", "s"),
];

/// Parse an absolute timestamp or a "time ago" duration into a Unix timestamp.
///
/// Absolute values are interpreted in `offset` when given, the local time zone
/// otherwise. Durations are subtracted from the current time.
pub fn parse_time(text: &str, offset: Option<&FixedOffset>) -> Result<i64> {
    let text = text.trim();
    if text.is_empty() {
        return Err(PtoolError::InvalidTime("empty str".into()));
    }

    let repaired;
    let text = if CONCATENATED_DATETIME.is_match(text) && text.is_char_boundary(10) {
        repaired = format!("{} {}", &text[..10], &text[10..]);
        repaired.as_str()
    } else {
        text
    };

    if let Ok(naive) = NaiveDateTime::parse_from_str(text, DATETIME_FORMAT) {
        let ts = match offset {
            Some(offset) => offset.from_local_datetime(&naive).single().map(|t| t.timestamp()),
            None => Local.from_local_datetime(&naive).earliest().map(|t| t.timestamp()),
        };
        return ts.ok_or_else(|| PtoolError::InvalidTime(text.to_string()));
    }

    match parse_time_duration(text) {
        Ok(seconds) => now()
            .checked_sub(seconds)
            .ok_or_else(|| PtoolError::InvalidTime(text.to_string())),
        Err(_) => Err(PtoolError::InvalidTime(text.to_string())),
    }
}

/// Parse a remaining-time countdown into the Unix timestamp it ends at.
pub fn parse_future_time(text: &str) -> Result<i64> {
    match parse_time_duration(text) {
        Ok(seconds) => now()
            .checked_add(seconds)
            .ok_or_else(|| PtoolError::InvalidTime(text.to_string())),
        Err(_) => Err(PtoolError::InvalidTime(text.to_string())),
    }
}

/// Parse a duration such as `2天3小时`, `1d 12h` or `90m` into whole seconds.
pub fn parse_time_duration(text: &str) -> Result<i64> {
    let mut normalized = text.to_string();
    for (token, unit) in UNIT_TOKENS {
        normalized = normalized.replace(token, unit);
    }
    parse_duration(&normalized)
}

/// Parse a duration expression made of `<number><unit>` components.
///
/// Units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`, `d`, `w`. Whitespace between
/// components is ignored and a bare `0` is accepted.
pub fn parse_duration(text: &str) -> Result<i64> {
    let invalid = || PtoolError::InvalidTime(text.to_string());

    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(invalid());
    }
    if compact == "0" {
        return Ok(0);
    }

    let mut rest = compact.as_str();
    let mut total = 0f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            "d" => 86400.0,
            "w" => 7.0 * 86400.0,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];
        total += value * scale;
    }

    if !total.is_finite() || total >= i64::MAX as f64 {
        return Err(invalid());
    }
    Ok(total as i64)
}

/// Parse a `YYYY-MM-DD` date as local midnight.
pub fn parse_local_date(text: &str) -> Result<i64> {
    let invalid = || PtoolError::InvalidTime(text.to_string());
    let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| invalid())?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|t| t.timestamp())
        .ok_or_else(invalid)
}

/// Format a Unix timestamp as local `YYYY-MM-DD HH:MM:SS`; `-` for unknown values.
pub fn format_time(ts: i64) -> String {
    if ts <= 0 {
        return "-".to_string();
    }
    match Local.timestamp_opt(ts, 0).single() {
        Some(t) => t.format(DATETIME_FORMAT).to_string(),
        None => "-".to_string(),
    }
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
