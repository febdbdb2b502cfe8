//! Notification payload, independent of how a sink renders it.

use serde::{Deserialize, Serialize};

use crate::models::{Offering, ReportLink};

/// Display attributes of one offering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportRow {
    pub name: String,
    pub status: String,
    pub estimated_gain: String,
    pub open_date: String,
    pub close_date: String,
    pub rating: String,
    pub size: String,
}

impl From<&Offering> for ReportRow {
    fn from(offering: &Offering) -> Self {
        Self {
            name: offering.name.clone(),
            status: offering.status_text.clone(),
            estimated_gain: offering.estimated_gain.to_string(),
            open_date: offering.open_date.to_string(),
            close_date: offering.close_date.to_string(),
            rating: offering.rating_label(),
            size: offering.size_class.to_string(),
        }
    }
}

/// A previously notified name, with current details when it is still listed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentRow {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ReportRow>,
}

/// Structured notification payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Report {
    pub subject: String,
    pub summary: String,
    /// Newly qualifying offerings, in scan order
    pub new_rows: Vec<ReportRow>,
    /// Recently notified names, most recent first
    pub recent_rows: Vec<RecentRow>,
    #[serde(default)]
    pub links: Vec<ReportLink>,
}

impl Report {
    /// Only reports with something new are delivered.
    pub fn should_send(&self) -> bool {
        !self.new_rows.is_empty()
    }

    /// Names that enter the ledger once this report is delivered.
    pub fn new_names(&self) -> Vec<String> {
        self.new_rows.iter().map(|row| row.name.clone()).collect()
    }
}
