//! Calendar-date coercion for imported values
//!
//! Spreadsheets store dates as day serials counted from 1899-12-30, with
//! the historical quirk that serial 60 names 1900-02-29 (a day that never
//! existed). Serials are calendar-day counts, so no timezone is applied.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::value::CellValue;

/// Largest serial a spreadsheet can hold (9999-12-31)
const MAX_SERIAL: f64 = 2_958_465.0;

/// Date-only formats tried in order. Two-digit years come first: `%y`
/// refuses four digits, while `%Y` would happily read "24" as year 24.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%m-%d-%y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%a, %d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Convert a spreadsheet day serial to a calendar date
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }

    let days = serial.floor() as i64;
    let (base, offset) = match days {
        // 1900-01-01 .. 1900-02-28: before the phantom leap day
        1..=59 => (NaiveDate::from_ymd_opt(1899, 12, 31)?, days),
        // The phantom 1900-02-29 collapses onto the last real February day
        60 => return NaiveDate::from_ymd_opt(1900, 2, 28),
        _ => (NaiveDate::from_ymd_opt(1899, 12, 30)?, days),
    };

    base.checked_add_signed(chrono::Duration::days(offset))
}

/// Parse a free-form date string
pub fn parse_date_str(input: &str) -> Option<NaiveDate> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Coerce a cell into a date: numbers are treated as serials, text is parsed
pub fn coerce_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Number(n) => serial_to_date(*n),
        CellValue::Text(s) => parse_date_str(s),
        _ => None,
    }
}

/// ISO calendar-date rendering (`YYYY-MM-DD`)
pub fn to_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
