//! Flexible numeric token parsing.
//!
//! Light curves arrive from spreadsheets, mission archives, hand-edited
//! notebooks and locale-specific exports, so a "number" can look like any
//! of these:
//!
//! | Token               | Value          |
//! |---------------------|----------------|
//! | `"0.9987"`          | 0.9987         |
//! | `1,234.56`          | 1234.56        |
//! | `1234,56`           | 1234.56        |
//! | `1,5e-3`            | 0.0015         |
//! | `−0.002` (U+2212)   | -0.002         |
//! | `٠٫٩٨` (Arabic)      | 0.98           |
//! | `0.998 ± 0.001`     | 0.998          |
//! | `12.5%`             | 12.5           |
//! | `2459000.5 (BJD)`   | 2459000.5      |
//! | `2020-01-01T12:00:00Z` | 18262.5 (days) |
//!
//! [`parse_number`] applies the normalisations in a fixed order and returns
//! `None` for anything that still is not a finite number.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;

/// Milliseconds per day; date tokens become fractional days since the Unix epoch.
const MS_PER_DAY: f64 = 86_400_000.0;

lazy_static! {
    static ref UNCERTAINTY_SUFFIX: Regex =
        Regex::new(r"\s*(?:±|\+/-|\+-).*$").expect("uncertainty pattern");
    static ref UNIT_SUFFIX: Regex = Regex::new(r"\s*\([^()]*\)\s*$").expect("unit pattern");
    static ref BARE_NUMBER: Regex =
        Regex::new(r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").expect("number pattern");
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

// ---------------------------------------------------------------------------
// Character normalisation
// ---------------------------------------------------------------------------

/// Map a single character onto its ASCII numeric equivalent.
///
/// Returns `None` for characters that should be dropped from a token
/// (quotes and the Arabic thousands separator).
fn normalize_char(c: char) -> Option<char> {
    match c {
        '"' | '\'' | '`' | '\u{201C}' | '\u{201D}' | '\u{2018}' | '\u{2019}' | '\u{00AB}'
        | '\u{00BB}' => None,
        // Arabic-Indic and Extended Arabic-Indic digits.
        '\u{0660}'..='\u{0669}' => char::from_digit(c as u32 - 0x0660, 10),
        '\u{06F0}'..='\u{06F9}' => char::from_digit(c as u32 - 0x06F0, 10),
        '\u{066B}' => Some('.'),
        '\u{066C}' => None,
        '\u{2010}'..='\u{2015}' | '\u{2212}' | '\u{FE58}' | '\u{FE63}' | '\u{FF0D}' => Some('-'),
        other => Some(other),
    }
}

/// Apply [`normalize_char`] to a whole string.
pub fn normalize_token_chars(s: &str) -> String {
    s.chars().filter_map(normalize_char).collect()
}

/// True if the text (after trimming) opens like a number would.
pub fn starts_numeric(s: &str) -> bool {
    match s.trim_start().chars().next() {
        Some(c) => matches!(normalize_char(c), Some(n) if n.is_ascii_digit() || n == '-' || n == '+' || n == '.'),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Decimal / grouping separators
// ---------------------------------------------------------------------------

/// Rewrite `,` and `.` so that the string uses `.` as its only decimal mark.
///
/// * both present: whichever occurs last is the decimal mark, the other
///   one is grouping and is removed;
/// * several commas only: grouping;
/// * a single comma only: decimal mark;
/// * several dots only: grouping.
fn resolve_separators(s: &str) -> String {
    let commas = s.matches(',').count();
    let dots = s.matches('.').count();

    match (commas, dots) {
        (0, 0) | (0, 1) => s.to_string(),
        (0, _) => s.replace('.', ""),
        (1, 0) => s.replace(',', "."),
        (_, 0) => s.replace(',', ""),
        _ => {
            let last_comma = s.rfind(',').unwrap_or(0);
            let last_dot = s.rfind('.').unwrap_or(0);
            if last_comma > last_dot {
                s.replace('.', "").replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Parse one field into a finite number.
///
/// Tokens that are not numbers but carry date/time separators (`:`, `-`,
/// `/`, `T`) are tried as timestamps and converted to days since the Unix
/// epoch.
pub fn parse_number(raw: &str) -> Option<f64> {
    let chars = normalize_token_chars(raw);
    let token = chars.trim();
    if token.is_empty() {
        return None;
    }

    let stripped = UNCERTAINTY_SUFFIX.replace(token, "");
    let stripped = UNIT_SUFFIX.replace(stripped.trim(), "");
    let stripped = stripped.trim().trim_end_matches('%').trim_end();

    if !stripped.is_empty() {
        let candidate = resolve_separators(stripped);
        if let Ok(value) = candidate.parse::<f64>() {
            if value.is_finite() {
                return Some(value);
            }
        }
    }

    if token.contains(&[':', '-', '/', 'T'][..]) {
        return parse_datetime_days(token);
    }
    None
}

/// Interpret a timestamp as fractional days since 1970-01-01T00:00:00Z.
///
/// Timestamps without an explicit offset are taken as UTC.
pub fn parse_datetime_days(token: &str) -> Option<f64> {
    let token = token.trim();

    let millis = if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        Some(dt.timestamp_millis())
    } else if let Some(naive) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(token, fmt).ok())
    {
        Some(naive.and_utc().timestamp_millis())
    } else {
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc().timestamp_millis())
    }?;

    let days = millis as f64 / MS_PER_DAY;
    days.is_finite().then_some(days)
}

/// Pull every bare number out of free text, in order of appearance.
///
/// Only `.` is treated as a decimal mark here; commas always separate.
pub fn scan_numbers(text: &str) -> Vec<f64> {
    let normalized = normalize_token_chars(text);
    BARE_NUMBER
        .find_iter(&normalized)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .collect()
}
