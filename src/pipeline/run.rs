// src/pipeline/run.rs

//! Run orchestrator.
//!
//! One run walks a fixed sequence of steps:
//!
//! ```text
//! FETCH -> NORMALIZE -> FILTER -> DIFF -> BUILD_REPORT -> NOTIFY -> COMMIT
//! ```
//!
//! A failed fetch or a failed delivery ends the run early with a
//! [`RunOutcome`] and leaves the ledger untouched. The ledger is only
//! committed after the sink accepted the report.

use std::collections::HashSet;
use std::fmt;

use chrono::{Local, NaiveDate};

use crate::error::Result;
use crate::models::{Config, Offering, RawRow};
use crate::pipeline::{DiffEngine, QualificationFilter, ReportBuilder, RowNormalizer};
use crate::services::{NotificationSink, PageSource, RowAccessor};
use crate::storage::LedgerStore;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The listing could not be fetched; nothing else happened.
    FetchFailed { reason: String },

    /// Nothing new qualified, so nothing was sent.
    NothingNew { qualified: usize, recent: usize },

    /// The report was delivered and the ledger updated.
    Delivered {
        notified: Vec<String>,
        ledger_size: usize,
    },

    /// The sink rejected the report; the ledger was not updated.
    DeliveryFailed { reason: String },

    /// Dry run: the report went to the sink but the ledger was not updated.
    Previewed { would_notify: Vec<String> },
}

impl RunOutcome {
    /// Names that reached recipients in this run.
    pub fn notified(&self) -> &[String] {
        match self {
            RunOutcome::Delivered { notified, .. } => notified,
            _ => &[],
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::FetchFailed { reason } => write!(f, "fetch failed: {reason}"),
            RunOutcome::NothingNew { qualified, recent } => write!(
                f,
                "nothing new ({qualified} qualified, {recent} recently notified)"
            ),
            RunOutcome::Delivered {
                notified,
                ledger_size,
            } => write!(
                f,
                "notified {} ({}), ledger holds {}",
                notified.len(),
                notified.join(", "),
                ledger_size
            ),
            RunOutcome::DeliveryFailed { reason } => write!(f, "delivery failed: {reason}"),
            RunOutcome::Previewed { would_notify } => {
                write!(f, "dry run, would notify {}", would_notify.len())
            }
        }
    }
}

/// Sequences one run over injected collaborators.
pub struct Orchestrator<'a> {
    config: &'a Config,
    page_source: &'a dyn PageSource,
    rows: &'a dyn RowAccessor,
    sink: &'a dyn NotificationSink,
    store: &'a dyn LedgerStore,
    commit: bool,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a Config,
        page_source: &'a dyn PageSource,
        rows: &'a dyn RowAccessor,
        sink: &'a dyn NotificationSink,
        store: &'a dyn LedgerStore,
    ) -> Self {
        Self {
            config,
            page_source,
            rows,
            sink,
            store,
            commit: true,
        }
    }

    /// Never commit the ledger, even when the sink succeeds.
    pub fn dry_run(mut self) -> Self {
        self.commit = false;
        self
    }

    /// Run against the local calendar date.
    pub async fn run(&self) -> Result<RunOutcome> {
        self.run_on(Local::now().date_naive()).await
    }

    /// Run as if today were `today`.
    ///
    /// Only ledger storage faults are returned as errors.
    pub async fn run_on(&self, today: NaiveDate) -> Result<RunOutcome> {
        let url = &self.config.source.url;

        // Step 1: fetch
        log::info!("Step 1/6: Fetching {}", url);
        let raw_rows = match self.fetch_rows(url).await {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!("Fetch failed, ending run: {}", e);
                return Ok(RunOutcome::FetchFailed {
                    reason: e.to_string(),
                });
            }
        };

        // Step 2: normalize
        log::info!("Step 2/6: Normalizing {} rows", raw_rows.len());
        let normalizer = RowNormalizer::new(today)?;
        let listed = normalize_rows(&normalizer, &raw_rows);
        log::info!("{} offerings listed", listed.len());

        // Step 3: filter
        let filter = QualificationFilter::from_config(&self.config.filter);
        log::info!("Step 3/6: Filtering ({:?} mode)", filter.mode());
        let qualified = filter.apply(&listed, today);
        log::info!("{} offerings qualify", qualified.len());

        // Step 4: diff
        log::info!("Step 4/6: Comparing against notification ledger");
        let ledger = self.store.load().await?;
        let result = DiffEngine::new(self.config.ledger.recent_window).calculate(
            &qualified,
            &ledger,
            &listed,
        );
        log::info!(
            "{} new, {} recently notified",
            result.new_offerings.len(),
            result.recent_offerings.len()
        );

        // Step 5: report
        log::info!("Step 5/6: Building report");
        let report = ReportBuilder::new(self.config.report.clone()).build(&result, today);
        if !report.should_send() {
            log::info!("No new qualifying IPOs, nothing to send");
            return Ok(RunOutcome::NothingNew {
                qualified: qualified.len(),
                recent: result.recent_offerings.len(),
            });
        }

        // Step 6: notify, then commit
        log::info!(
            "Step 6/6: Sending '{}' to {} recipients",
            report.subject,
            self.config.mail.recipients.len()
        );
        if let Err(e) = self.sink.send(&self.config.mail.recipients, &report).await {
            log::error!("Delivery failed, ledger left unchanged: {}", e);
            return Ok(RunOutcome::DeliveryFailed {
                reason: e.to_string(),
            });
        }

        let names = report.new_names();
        if !self.commit {
            log::info!("Dry run, ledger not updated");
            return Ok(RunOutcome::Previewed {
                would_notify: names,
            });
        }

        let ledger = self.store.commit(&names).await?;
        log::info!("Ledger updated, {} entries", ledger.len());

        Ok(RunOutcome::Delivered {
            notified: names,
            ledger_size: ledger.len(),
        })
    }

    async fn fetch_rows(&self, url: &str) -> Result<Vec<RawRow>> {
        let markup = self.page_source.fetch(url).await?;
        self.rows.rows_of(&markup)
    }
}

/// Normalize rows in order, skipping rejects and repeated names.
fn normalize_rows(normalizer: &RowNormalizer, rows: &[RawRow]) -> Vec<Offering> {
    let mut seen = HashSet::new();
    let mut offerings = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        match normalizer.normalize(row) {
            Ok(offering) => {
                if seen.insert(offering.name.clone()) {
                    offerings.push(offering);
                } else {
                    log::debug!("Row {}: duplicate '{}' dropped", index, offering.name);
                }
            }
            Err(e) => log::debug!("Row {} skipped: {}", index, e),
        }
    }

    offerings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Column;

    fn row(name: &str, status: &str) -> RawRow {
        RawRow::new()
            .with(Column::Name, name)
            .with(Column::Status, status)
            .with(Column::Rating, "🔥🔥🔥🔥🔥")
            .with(Column::EstimatedGain, "(10%)")
            .with(Column::OpenDate, "08-Jan")
            .with(Column::CloseDate, "12-Jan")
    }

    #[test]
    fn test_normalize_rows_first_occurrence_wins() {
        let normalizer = RowNormalizer::new(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()).unwrap();
        let rows = vec![
            RawRow::new().with(Column::Name, "Header"),
            row("Acme Ltd IPO", "Open"),
            row("Acme Ltd IPO", "Closed"),
            row("Beta SME", "Upcoming"),
        ];

        let offerings = normalize_rows(&normalizer, &rows);
        let names: Vec<&str> = offerings.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Acme Ltd IPO", "Beta SME"]);
        assert_eq!(offerings[0].status_text, "Open");
    }

    #[test]
    fn test_outcome_display() {
        let outcome = RunOutcome::Delivered {
            notified: vec!["A".into(), "B".into()],
            ledger_size: 4,
        };
        assert_eq!(outcome.to_string(), "notified 2 (A, B), ledger holds 4");
        assert_eq!(outcome.notified().len(), 2);
        assert!(
            RunOutcome::FetchFailed {
                reason: "x".into()
            }
            .notified()
            .is_empty()
        );
    }
}
