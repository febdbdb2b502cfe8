//! Utility functions and helpers.

pub mod http;

use chrono::{Datelike, NaiveDate};

/// Formats that carry their own year.
const FULL_DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%B %d, %Y",
];

/// Formats without a year, completed from the reference date.
const YEARLESS_DATE_FORMATS: [&str; 2] = ["%d-%b-%Y", "%d %b %Y"];

/// Farthest a year-less date may sit from the reference date before it is
/// moved into the neighbouring year.
const YEAR_ROLLOVER_DAYS: i64 = 183;

/// Parse a listing date cell.
///
/// Dates without a year ("17-Jan") resolve to the occurrence nearest to
/// `reference`: "02-Jan" read on 2024-12-30 is 2025-01-02.
pub fn parse_listing_date(text: &str, reference: NaiveDate) -> Option<NaiveDate> {
    let text = normalize_whitespace(text);
    let text = text.trim_end_matches('.');
    if text.is_empty() {
        return None;
    }

    if let Some(date) = FULL_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    {
        return Some(date);
    }

    let separator = if text.contains('-') { "-" } else { " " };
    let in_year = |year: i32| {
        let with_year = format!("{text}{separator}{year}");
        YEARLESS_DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(&with_year, fmt).ok())
    };

    let year = reference.year();
    let date = in_year(year)?;
    let offset = (date - reference).num_days();
    if offset < -YEAR_ROLLOVER_DAYS {
        in_year(year + 1).or(Some(date))
    } else if offset > YEAR_ROLLOVER_DAYS {
        in_year(year - 1).or(Some(date))
    } else {
        Some(date)
    }
}

/// Collapse runs of whitespace into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
