// src/models/mod.rs

//! Domain models for the notifier.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod offering;
mod report;
mod row;

// Re-export all public types
pub use config::{
    ColumnLabels, Config, FilterConfig, FilterMode, LedgerConfig, MailConfig, ReportConfig,
    ReportLink, SourceConfig, split_recipients,
};
pub use offering::{EstimatedGain, ListingDate, Offering, SizeClass, Status};
pub use report::{RecentRow, Report, ReportRow};
pub use row::{Column, RawRow};
