//! Diff between freshly qualified offerings and the notification ledger.
//!
//! Splits a run's qualified offerings into those never notified before and
//! the recently notified names shown for context. Recent entries are not
//! re-checked against the current rules; an entry may no longer qualify.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::Offering;
use crate::storage::NotificationLedger;

/// A recently notified name, with its offering when still listed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecentEntry {
    pub name: String,
    pub offering: Option<Offering>,
}

/// Per-run classification of qualified offerings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct QualificationResult {
    /// Qualifying and absent from the ledger, in scan order
    pub new_offerings: Vec<Offering>,
    /// Ledger entries, most recent first
    pub recent_offerings: Vec<RecentEntry>,
}

impl QualificationResult {
    pub fn has_new(&self) -> bool {
        !self.new_offerings.is_empty()
    }

    pub fn new_names(&self) -> Vec<String> {
        self.new_offerings.iter().map(|o| o.name.clone()).collect()
    }
}

/// Calculator for the new/recent partition.
#[derive(Debug, Clone)]
pub struct DiffEngine {
    /// How many ledger entries to report as recent
    recent_window: usize,
}

impl DiffEngine {
    pub fn new(recent_window: usize) -> Self {
        Self { recent_window }
    }

    /// Partition `qualified` against `ledger`.
    ///
    /// `listed` is everything normalized this run; it is only used to attach
    /// current details to recent entries.
    pub fn calculate(
        &self,
        qualified: &[Offering],
        ledger: &NotificationLedger,
        listed: &[Offering],
    ) -> QualificationResult {
        let mut seen: HashSet<String> = HashSet::new();
        let new_offerings = qualified
            .iter()
            .filter(|o| !ledger.contains(&o.name))
            .filter(|o| seen.insert(o.name.clone()))
            .cloned()
            .collect();

        let recent_offerings = ledger
            .recent(self.recent_window)
            .into_iter()
            .map(|name| RecentEntry {
                name: name.to_string(),
                offering: listed.iter().find(|o| o.name == name).cloned(),
            })
            .collect();

        QualificationResult {
            new_offerings,
            recent_offerings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EstimatedGain, ListingDate, SizeClass, Status};

    fn make_offering(name: &str) -> Offering {
        Offering {
            name: name.to_string(),
            status: Status::Open,
            status_text: "Open".into(),
            rating: 5,
            estimated_gain: EstimatedGain::Percent(1.0),
            open_date: ListingDate {
                raw: String::new(),
                date: None,
            },
            close_date: ListingDate {
                raw: String::new(),
                date: None,
            },
            size_class: SizeClass::Unknown,
        }
    }

    fn new_names(result: &QualificationResult) -> Vec<&str> {
        result.new_offerings.iter().map(|o| o.name.as_str()).collect()
    }

    #[test]
    fn test_empty_ledger_everything_new() {
        let qualified = vec![make_offering("A"), make_offering("B")];
        let ledger = NotificationLedger::new(10);

        let result = DiffEngine::new(5).calculate(&qualified, &ledger, &qualified);
        assert_eq!(new_names(&result), vec!["A", "B"]);
        assert!(result.recent_offerings.is_empty());
        assert!(result.has_new());
    }

    #[test]
    fn test_notified_names_are_not_new() {
        let qualified = vec![make_offering("A"), make_offering("B"), make_offering("C")];
        let ledger = NotificationLedger::from_names(["B"], 10);

        let result = DiffEngine::new(5).calculate(&qualified, &ledger, &qualified);
        assert_eq!(new_names(&result), vec!["A", "C"]);
        assert_eq!(result.recent_offerings.len(), 1);
        assert_eq!(result.recent_offerings[0].name, "B");
        assert_eq!(
            result.recent_offerings[0].offering.as_ref().map(|o| o.name.as_str()),
            Some("B")
        );
    }

    #[test]
    fn test_recent_window_and_order() {
        let ledger = NotificationLedger::from_names(["A", "B", "C", "D", "E", "F", "G"], 10);
        let listed = vec![make_offering("G")];

        let result = DiffEngine::new(5).calculate(&[], &ledger, &listed);
        let recent: Vec<&str> = result
            .recent_offerings
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(recent, vec!["G", "F", "E", "D", "C"]);
        assert!(result.recent_offerings[0].offering.is_some());
        assert!(result.recent_offerings[1].offering.is_none());
    }

    #[test]
    fn test_duplicate_names_first_wins() {
        let mut second = make_offering("A");
        second.rating = 4;
        let qualified = vec![make_offering("A"), second];
        let ledger = NotificationLedger::new(10);

        let result = DiffEngine::new(5).calculate(&qualified, &ledger, &qualified);
        assert_eq!(result.new_offerings.len(), 1);
        assert_eq!(result.new_offerings[0].rating, 5);
    }

    #[test]
    fn test_diff_is_idempotent() {
        let qualified = vec![make_offering("A"), make_offering("B"), make_offering("C")];
        let ledger = NotificationLedger::from_names(["B", "Z"], 10);
        let engine = DiffEngine::new(5);

        let first = engine.calculate(&qualified, &ledger, &qualified);
        let second = engine.calculate(&qualified, &ledger, &qualified);
        assert_eq!(first, second);
    }
}
