pub mod time;

use std::sync::LazyLock;

use regex::Regex;

use crate::app::{PtoolError, Result};

static SIZE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(\d+(?:\.\d+)?)\s*([kmgtpe])?i?b?$").unwrap()
});

/// Parse an integer rendered with thousands separators. Unparsable input yields 0.
pub fn parse_int(text: &str) -> i64 {
    text.trim().replace(',', "").parse().unwrap_or(0)
}

/// Parse a human readable size (`1.5 GB`, `700MiB`, `12 kb`) into bytes.
///
/// Every unit prefix is binary: `1 KB` and `1 KiB` both mean 1024 bytes.
pub fn parse_size(text: &str) -> Result<i64> {
    let normalized = text.trim().replace(',', "");
    let captures = SIZE_PATTERN
        .captures(&normalized)
        .ok_or_else(|| PtoolError::InvalidSize(text.to_string()))?;

    let value: f64 = captures[1]
        .parse()
        .map_err(|_| PtoolError::InvalidSize(text.to_string()))?;
    let exponent = match captures.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        None => 0,
        Some(unit) => match unit.as_str() {
            "k" => 1,
            "m" => 2,
            "g" => 3,
            "t" => 4,
            "p" => 5,
            _ => 6,
        },
    };

    Ok((value * 1024f64.powi(exponent)) as i64)
}

/// Render a byte count with a binary unit, e.g. `1.50 GiB`.
pub fn format_size(bytes: i64) -> String {
    const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
    let mut value = bytes.max(0) as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes.max(0))
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

/// Case-insensitive substring test.
pub fn contains_i(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Host name of a URL, or an empty string when the URL does not parse.
pub fn hostname_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_with_separators() {
        assert_eq!(parse_int("1,234"), 1234);
        assert_eq!(parse_int(" 42 "), 42);
        assert_eq!(parse_int("n/a"), 0);
        assert_eq!(parse_int(""), 0);
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1 KB").unwrap(), 1024);
        assert_eq!(parse_size("1KiB").unwrap(), 1024);
        assert_eq!(parse_size("1.5 GB").unwrap(), 1_610_612_736);
        assert_eq!(parse_size("700 MiB").unwrap(), 700 * 1024 * 1024);
        assert_eq!(parse_size("1,024 B").unwrap(), 1024);
        assert_eq!(parse_size("2tb").unwrap(), 2 * 1024_i64.pow(4));
        assert_eq!(parse_size("512").unwrap(), 512);
    }

    #[test]
    fn test_parse_size_invalid() {
        assert!(parse_size("").is_err());
        assert!(parse_size("big").is_err());
        assert!(parse_size("1.5 ZB").is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.50 KiB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GiB");
    }

    #[test]
    fn test_contains_i() {
        assert!(contains_i("Ubuntu 24.04 ISO", "ubuntu"));
        assert!(!contains_i("Ubuntu", "debian"));
    }

    #[test]
    fn test_hostname_of() {
        assert_eq!(hostname_of("https://tracker.example.org:8443/announce"), "tracker.example.org");
        assert_eq!(hostname_of("not a url"), "");
    }
}
