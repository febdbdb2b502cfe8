//! Qualification filter.
//!
//! Two policies decide whether an offering is alert-worthy, selected by
//! [`FilterMode`]. Both also require a qualifying rating.
//!
//! - **Status mode** keeps rows whose status is `Open`. `Upcoming` rows are
//!   skipped and scanning continues; any other status ends the scan. This
//!   assumes the listing is sorted with current rows before closed ones.
//! - **Window mode** ignores status and keeps rows closing between today and
//!   `today + window_days`, both inclusive.

use chrono::NaiveDate;

use crate::models::{FilterConfig, FilterMode, Offering, Status};

/// Order-preserving qualification filter.
#[derive(Debug, Clone)]
pub struct QualificationFilter {
    mode: FilterMode,
    window_days: u32,
    qualifying_ratings: Vec<u8>,
}

impl QualificationFilter {
    pub fn new(mode: FilterMode, window_days: u32, qualifying_ratings: Vec<u8>) -> Self {
        Self {
            mode,
            window_days,
            qualifying_ratings,
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(
            config.mode,
            config.window_days,
            config.qualifying_ratings.clone(),
        )
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Return the qualifying offerings in their original order.
    pub fn apply(&self, offerings: &[Offering], today: NaiveDate) -> Vec<Offering> {
        match self.mode {
            FilterMode::Status => self.scan_by_status(offerings),
            FilterMode::Window => self.scan_by_window(offerings, today),
        }
    }

    fn scan_by_status(&self, offerings: &[Offering]) -> Vec<Offering> {
        let mut qualified = Vec::new();

        for offering in offerings {
            match offering.status {
                Status::Upcoming => continue,
                Status::Open => {
                    if self.has_qualifying_rating(offering) {
                        qualified.push(offering.clone());
                    }
                }
                Status::Closed | Status::Unknown => {
                    log::debug!(
                        "Status scan stopped at '{}' ({})",
                        offering.name,
                        offering.status_text
                    );
                    break;
                }
            }
        }

        qualified
    }

    fn scan_by_window(&self, offerings: &[Offering], today: NaiveDate) -> Vec<Offering> {
        offerings
            .iter()
            .filter(|o| closes_within(o.close_date.date, today, self.window_days))
            .filter(|o| self.has_qualifying_rating(o))
            .cloned()
            .collect()
    }

    fn has_qualifying_rating(&self, offering: &Offering) -> bool {
        self.qualifying_ratings.contains(&offering.rating)
    }
}

/// Whether `close` lies in `today..=today + window_days`.
///
/// An unknown close date never qualifies.
pub fn closes_within(close: Option<NaiveDate>, today: NaiveDate, window_days: u32) -> bool {
    close.is_some_and(|date| {
        let days_left = (date - today).num_days();
        (0..=i64::from(window_days)).contains(&days_left)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EstimatedGain, ListingDate, SizeClass};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_offering(name: &str, status: Status, rating: u8, close: Option<NaiveDate>) -> Offering {
        Offering {
            name: name.to_string(),
            status,
            status_text: format!("{status:?}"),
            rating,
            estimated_gain: EstimatedGain::Percent(10.0),
            open_date: ListingDate {
                raw: String::new(),
                date: None,
            },
            close_date: ListingDate {
                raw: close.map(|d| d.to_string()).unwrap_or_default(),
                date: close,
            },
            size_class: SizeClass::Unknown,
        }
    }

    fn names(offerings: &[Offering]) -> Vec<&str> {
        offerings.iter().map(|o| o.name.as_str()).collect()
    }

    #[test]
    fn test_window_boundaries() {
        let today = ymd(2024, 1, 10);
        assert!(closes_within(Some(ymd(2024, 1, 10)), today, 3));
        assert!(closes_within(Some(ymd(2024, 1, 13)), today, 3));
        assert!(!closes_within(Some(ymd(2024, 1, 14)), today, 3));
        assert!(!closes_within(Some(ymd(2024, 1, 9)), today, 3));
        assert!(!closes_within(None, today, 3));
    }

    #[test]
    fn test_window_mode_ignores_status() {
        let today = ymd(2024, 1, 10);
        let filter = QualificationFilter::new(FilterMode::Window, 3, vec![4, 5]);
        let offerings = vec![
            make_offering("Inside", Status::Closed, 5, Some(ymd(2024, 1, 13))),
            make_offering("TooLate", Status::Open, 5, Some(ymd(2024, 1, 14))),
            make_offering("Past", Status::Open, 5, Some(ymd(2024, 1, 9))),
            make_offering("NoDate", Status::Open, 5, None),
            make_offering("LowRating", Status::Open, 3, Some(ymd(2024, 1, 11))),
            make_offering("Today", Status::Upcoming, 4, Some(ymd(2024, 1, 10))),
        ];

        let result = filter.apply(&offerings, today);
        assert_eq!(names(&result), vec!["Inside", "Today"]);
    }

    #[test]
    fn test_status_mode_skips_upcoming_and_stops_at_closed() {
        let today = ymd(2024, 1, 10);
        let filter = QualificationFilter::new(FilterMode::Status, 3, vec![4, 5]);
        let offerings = vec![
            make_offering("Soon", Status::Upcoming, 5, None),
            make_offering("A", Status::Open, 5, None),
            make_offering("B", Status::Open, 3, None),
            make_offering("C", Status::Open, 4, Some(ymd(2030, 1, 1))),
            make_offering("Done", Status::Closed, 5, None),
            make_offering("Later", Status::Open, 5, None),
        ];

        let result = filter.apply(&offerings, today);
        assert_eq!(names(&result), vec!["A", "C"]);
    }

    #[test]
    fn test_status_mode_stops_at_unknown() {
        let filter = QualificationFilter::new(FilterMode::Status, 3, vec![4, 5]);
        let offerings = vec![
            make_offering("Odd", Status::Unknown, 5, None),
            make_offering("A", Status::Open, 5, None),
        ];

        assert!(filter.apply(&offerings, ymd(2024, 1, 10)).is_empty());
    }

    #[test]
    fn test_rating_gate() {
        let filter = QualificationFilter::new(FilterMode::Status, 3, vec![4, 5]);
        let offerings: Vec<Offering> = (0..=5)
            .map(|r| make_offering(&format!("R{r}"), Status::Open, r, None))
            .collect();

        let result = filter.apply(&offerings, ymd(2024, 1, 10));
        assert_eq!(names(&result), vec!["R4", "R5"]);
    }
}
