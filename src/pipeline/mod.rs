//! Notification pipeline.
//!
//! - `normalize`: raw rows into offerings
//! - `filter`: qualification policies
//! - `diff`: new versus already notified
//! - `report`: transport-agnostic payload
//! - `run`: the orchestrator tying the steps together

pub mod diff;
pub mod filter;
pub mod normalize;
pub mod report;
pub mod run;

pub use diff::{DiffEngine, QualificationResult, RecentEntry};
pub use filter::{QualificationFilter, closes_within};
pub use normalize::{RowNormalizer, RowParseError};
pub use report::ReportBuilder;
pub use run::{Orchestrator, RunOutcome};
