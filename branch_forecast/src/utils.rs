//! Utility functions for the branch_forecast crate
//!
//! Date parsing here is deliberately permissive: upstream exports mix ISO
//! dates, ISO date-times and short "Aug 16" labels without a year.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Calendar-only formats
const DATE_FORMATS: &[&str] = &["%Y-%m-%d"];

/// Date-time formats; only the calendar date is kept
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Month-and-day formats, completed with the reference year
const YEARLESS_FORMATS: &[&str] = &["%b %d %Y", "%B %d %Y"];

/// Outcome of parsing one date string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDate {
    /// The string matched one of the accepted forms
    Parsed(NaiveDate),
    /// No accepted form matched
    Unparsable,
}

impl ParsedDate {
    /// The parsed calendar date, if any
    pub fn date(self) -> Option<NaiveDate> {
        match self {
            ParsedDate::Parsed(date) => Some(date),
            ParsedDate::Unparsable => None,
        }
    }

    /// Whether the string was parsed
    pub fn is_parsed(self) -> bool {
        matches!(self, ParsedDate::Parsed(_))
    }
}

/// Parse a date string against the ordered list of accepted forms
///
/// Strings without a year ("Aug 16") take `reference_year`.
pub fn parse_date(input: &str, reference_year: i32) -> ParsedDate {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ParsedDate::Unparsable;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return ParsedDate::Parsed(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return ParsedDate::Parsed(datetime.date());
        }
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return ParsedDate::Parsed(datetime.date_naive());
    }

    let with_year = format!("{} {}", trimmed, reference_year);
    for format in YEARLESS_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&with_year, format) {
            return ParsedDate::Parsed(date);
        }
    }

    ParsedDate::Unparsable
}

/// Parse an event date, trying the leading token before the whole string
///
/// Promotion exports carry values such as `"2025-08-16 10:00"`; the first
/// token alone is the calendar date.
pub fn parse_event_date(input: &str, reference_year: i32) -> ParsedDate {
    if let Some(token) = input.split_whitespace().next() {
        if let parsed @ ParsedDate::Parsed(_) = parse_date(token, reference_year) {
            return parsed;
        }
    }
    parse_date(input, reference_year)
}

/// Round a forecast value to cents
pub fn round_value(value: f64) -> f64 {
    forecast_math::round_to(value, 2)
}

/// Whole days from `from` to `to` (negative when `to` is earlier)
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}
