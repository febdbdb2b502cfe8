//! External collaborators behind traits.
//!
//! - [`PageSource`]: fetches the listing markup
//! - [`RowAccessor`]: splits markup into raw rows
//! - [`NotificationSink`]: delivers a report

pub mod notify;
pub mod page;
pub mod rows;

pub use notify::{LogSink, NotificationSink, SmtpSink, render_html};
pub use page::{HttpPageSource, PageSource};
pub use rows::{RowAccessor, TableRowAccessor};

use scraper::Selector;

use crate::error::{AppError, Result};

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
