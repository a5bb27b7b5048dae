// 📅 Date Normalizer
// Hand-maintained logs write dates as "01-Jan-24", "March 5, 2024", "2024-03-05"...
// Everything becomes a NaiveDate or None.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Values people type into a date cell when there is no date
pub const DATE_PLACEHOLDERS: &[&str] = &["—", "-", "NA", "N/A"];

/// Literary formats, tried in order. "%d-%b-%y" must come before "%d-%b-%Y",
/// otherwise "01-Jan-24" parses as the year 24.
const LITERARY_FORMATS: &[&str] = &["%d-%b-%y", "%d-%b-%Y", "%B %d, %Y", "%b %d, %Y"];

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a raw date cell into a calendar date
///
/// Returns `None` for empty cells, placeholders and anything no supported
/// format accepts. Only the date component is kept.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() || DATE_PLACEHOLDERS.contains(&value) {
        return None;
    }

    LITERARY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| parse_iso(value))
}

/// Strict ISO 8601 date or date-time, date part only
fn parse_iso(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    if let Some(datetime) = ISO_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return Some(datetime.date());
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Canonical ISO form used in every output record
pub fn to_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ============================================================================
// TESTS
// ============================================================================
