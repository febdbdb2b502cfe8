//! Row normalization.
//!
//! Turns one raw table row into an [`Offering`], or rejects it. Header,
//! footer and malformed rows are expected to be rejected; rejection is a
//! value, never a panic or an [`AppError`](crate::error::AppError).

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use crate::error::Result;
use crate::models::{Column, EstimatedGain, ListingDate, Offering, RawRow, SizeClass, Status};
use crate::utils::{normalize_whitespace, parse_listing_date};

/// Marker repeated once per rating point.
const RATING_MARKER: char = '🔥';

/// Highest rating on the scale.
pub const MAX_RATING: u8 = 5;

/// Why a row did not become an offering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowParseError {
    #[error("missing column '{0}'")]
    MissingColumn(Column),

    #[error("empty offering name")]
    EmptyName,
}

/// Converts raw rows into offerings.
#[derive(Debug, Clone)]
pub struct RowNormalizer {
    today: NaiveDate,
    gain_pattern: Regex,
    caption_pattern: Regex,
}

impl RowNormalizer {
    /// Create a normalizer; `today` anchors dates written without a year.
    pub fn new(today: NaiveDate) -> Result<Self> {
        Ok(Self {
            today,
            gain_pattern: Regex::new(r"\(\s*([-−]?\d+(?:\.\d+)?)\s*%\s*\)")?,
            caption_pattern: Regex::new(r"(?i)rating\s*(\d)\s*/\s*5")?,
        })
    }

    /// Normalize a single row.
    pub fn normalize(&self, row: &RawRow) -> std::result::Result<Offering, RowParseError> {
        let cell = |column: Column| row.get(column).ok_or(RowParseError::MissingColumn(column));

        // Required columns, checked in a fixed order so the reported one is stable.
        for column in Column::ALL {
            cell(column)?;
        }

        let name = normalize_whitespace(cell(Column::Name)?);
        if name.is_empty() {
            return Err(RowParseError::EmptyName);
        }

        let status_text = normalize_whitespace(cell(Column::Status)?);

        Ok(Offering {
            status: Status::from_text(&status_text),
            status_text,
            rating: self.extract_rating(cell(Column::Rating)?),
            estimated_gain: self.extract_gain(cell(Column::EstimatedGain)?),
            open_date: self.listing_date(cell(Column::OpenDate)?),
            close_date: self.listing_date(cell(Column::CloseDate)?),
            size_class: SizeClass::from_name(&name),
            name,
        })
    }

    /// Rating from marker count, falling back to a "Rating N/5" caption.
    pub fn extract_rating(&self, text: &str) -> u8 {
        let markers = text.chars().filter(|c| *c == RATING_MARKER).count();
        if markers > 0 {
            return markers.min(MAX_RATING as usize) as u8;
        }

        self.caption_pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u8>().ok())
            .map_or(0, |rating| rating.min(MAX_RATING))
    }

    /// Signed percentage inside parentheses, e.g. "₹20 (−3.5%)" is -3.5.
    pub fn extract_gain(&self, text: &str) -> EstimatedGain {
        self.gain_pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().replace('−', "-").parse::<f64>().ok())
            .map_or_else(
                || EstimatedGain::Raw(normalize_whitespace(text)),
                EstimatedGain::Percent,
            )
    }

    fn listing_date(&self, text: &str) -> ListingDate {
        let raw = normalize_whitespace(text);
        ListingDate {
            date: parse_listing_date(&raw, self.today),
            raw,
        }
    }
}
