//! Report building.

use chrono::NaiveDate;

use crate::models::{RecentRow, Report, ReportConfig, ReportRow};
use crate::pipeline::diff::QualificationResult;

/// Subject used when nothing new qualified.
const NOTHING_NEW_SUBJECT: &str = "No new qualifying IPOs";

/// Builds transport-agnostic reports from a diff result.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    config: ReportConfig,
}

impl ReportBuilder {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// Build the payload for `result`, dated `today`.
    ///
    /// A report is always built; whether it is sent is decided by
    /// [`Report::should_send`], which requires at least one new offering.
    pub fn build(&self, result: &QualificationResult, today: NaiveDate) -> Report {
        let date = today.format("%Y-%m-%d");
        let new_rows: Vec<ReportRow> = result.new_offerings.iter().map(ReportRow::from).collect();
        let recent_rows: Vec<RecentRow> = result
            .recent_offerings
            .iter()
            .map(|entry| RecentRow {
                name: entry.name.clone(),
                details: entry.offering.as_ref().map(ReportRow::from),
            })
            .collect();

        let (subject, summary) = if new_rows.is_empty() {
            (
                format!("{NOTHING_NEW_SUBJECT} - {date}"),
                format!(
                    "No new qualifying IPOs; {} recently notified.",
                    recent_rows.len()
                ),
            )
        } else {
            let plural = if new_rows.len() == 1 { "" } else { "s" };
            (
                format!("{} - {date}", self.config.title),
                format!(
                    "{} new qualifying IPO{plural}: {}",
                    new_rows.len(),
                    new_rows
                        .iter()
                        .map(|row| row.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )
        };

        Report {
            subject,
            summary,
            new_rows,
            recent_rows,
            links: self.config.links.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EstimatedGain, ListingDate, Offering, SizeClass, Status};
    use crate::pipeline::diff::RecentEntry;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn acme() -> Offering {
        Offering {
            name: "Acme Ltd IPO".into(),
            status: Status::Open,
            status_text: "Open".into(),
            rating: 5,
            estimated_gain: EstimatedGain::Percent(-3.5),
            open_date: ListingDate {
                raw: "08-Jan".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, 8),
            },
            close_date: ListingDate {
                raw: "TBA".into(),
                date: None,
            },
            size_class: SizeClass::Small,
        }
    }

    #[test]
    fn test_report_with_new_offerings() {
        let result = QualificationResult {
            new_offerings: vec![acme()],
            recent_offerings: vec![RecentEntry {
                name: "Old IPO".into(),
                offering: None,
            }],
        };

        let report = ReportBuilder::new(ReportConfig::default()).build(&result, today());
        assert!(report.should_send());
        assert_eq!(report.subject, "New Qualified IPOs - 2024-01-10");
        assert_eq!(report.summary, "1 new qualifying IPO: Acme Ltd IPO");
        assert_eq!(report.new_names(), vec!["Acme Ltd IPO"]);

        let row = &report.new_rows[0];
        assert_eq!(row.status, "Open");
        assert_eq!(row.estimated_gain, "-3.5 %");
        assert_eq!(row.open_date, "2024-01-08");
        assert_eq!(row.close_date, "TBA");
        assert_eq!(row.rating, "5.0/5");
        assert_eq!(row.size, "Small");

        assert_eq!(report.recent_rows[0].name, "Old IPO");
        assert!(report.recent_rows[0].details.is_none());
        assert_eq!(report.links.len(), 2);
    }

    #[test]
    fn test_report_without_new_offerings() {
        let result = QualificationResult {
            new_offerings: vec![],
            recent_offerings: vec![RecentEntry {
                name: "Acme Ltd IPO".into(),
                offering: Some(acme()),
            }],
        };

        let report = ReportBuilder::new(ReportConfig::default()).build(&result, today());
        assert!(!report.should_send());
        assert_eq!(report.subject, "No new qualifying IPOs - 2024-01-10");
        assert!(report.new_rows.is_empty());
        assert_eq!(
            report.recent_rows[0].details.as_ref().map(|d| d.rating.as_str()),
            Some("5.0/5")
        );
    }
}
