//! Offering data structure.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Subscription status of an offering as shown in the listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Status {
    Upcoming,
    Open,
    Closed,
    Unknown,
}

impl Status {
    /// Classify raw status text.
    ///
    /// "Upcoming" is checked first so that text such as "Upcoming (Opens
    /// Monday)" never counts as open.
    pub fn from_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("upcoming") {
            Status::Upcoming
        } else if lower.contains("open") {
            Status::Open
        } else if lower.contains("clos") {
            Status::Closed
        } else {
            Status::Unknown
        }
    }
}

/// Size class derived from the offering's naming convention.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SizeClass {
    Small,
    Large,
    Unknown,
}

impl SizeClass {
    /// Names ending in "IPO" are small, names carrying "SME" elsewhere are large.
    pub fn from_name(name: &str) -> Self {
        if name.ends_with("IPO") {
            SizeClass::Small
        } else if name.contains("SME") {
            SizeClass::Large
        } else {
            SizeClass::Unknown
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SizeClass::Small => "Small",
            SizeClass::Large => "Large",
            SizeClass::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Estimated listing gain.
///
/// When the listing cell carries no parenthesized percentage the raw text is
/// kept, and numeric comparisons see no value at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EstimatedGain {
    Percent(f64),
    Raw(String),
}

impl EstimatedGain {
    pub fn percent(&self) -> Option<f64> {
        match self {
            EstimatedGain::Percent(value) => Some(*value),
            EstimatedGain::Raw(_) => None,
        }
    }
}

impl fmt::Display for EstimatedGain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimatedGain::Percent(value) => write!(f, "{value} %"),
            EstimatedGain::Raw(text) => f.write_str(text),
        }
    }
}

/// A calendar date cell, keeping the source text for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingDate {
    pub raw: String,
    pub date: Option<NaiveDate>,
}

impl fmt::Display for ListingDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.date {
            Some(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            None => f.write_str(&self.raw),
        }
    }
}

/// One row of the IPO listing for a single run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Offering {
    /// Offering name, the identity key
    pub name: String,

    /// Parsed status
    pub status: Status,

    /// Status text as displayed by the source
    pub status_text: String,

    /// Rating on a 0-5 scale, 0 meaning unrated
    pub rating: u8,

    /// Estimated listing gain
    pub estimated_gain: EstimatedGain,

    /// Subscription open date
    pub open_date: ListingDate,

    /// Subscription close date
    pub close_date: ListingDate,

    /// Size class derived from the name
    pub size_class: SizeClass,
}

impl Offering {
    /// Rating as shown to readers, e.g. "4.0/5" or "No Rating".
    pub fn rating_label(&self) -> String {
        if self.rating > 0 {
            format!("{}.0/5", self.rating)
        } else {
            "No Rating".to_string()
        }
    }
}
