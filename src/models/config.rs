//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use lettre::message::Mailbox;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::services::parse_selector;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Listing page and HTTP behavior
    #[serde(default)]
    pub source: SourceConfig,

    /// Table column labels
    #[serde(default)]
    pub columns: ColumnLabels,

    /// Qualification rules
    #[serde(default)]
    pub filter: FilterConfig,

    /// Notification ledger settings
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Mail transport settings
    #[serde(default)]
    pub mail: MailConfig,

    /// Report wording and links
    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, or return defaults when the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Config file {:?} not found. Using defaults.", path);
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Overlay settings from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay settings from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = var("IPO_SOURCE_URL") {
            self.source.url = url;
        }
        if let Some(mode) = var("FILTER_MODE") {
            self.filter.mode = mode.parse()?;
        }
        if let Some(days) = var("WINDOW_DAYS") {
            self.filter.window_days = parse_number("WINDOW_DAYS", &days)?;
        }
        if let Some(ratings) = var("RATING_THRESHOLD") {
            self.filter.qualifying_ratings = ratings
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(|r| parse_number("RATING_THRESHOLD", r))
                .collect::<Result<_>>()?;
        }
        if let Some(path) = var("LEDGER_PATH") {
            self.ledger.path = PathBuf::from(path);
        }
        if let Some(capacity) = var("LEDGER_CAPACITY") {
            self.ledger.capacity = parse_number("LEDGER_CAPACITY", &capacity)?;
        }
        if let Some(server) = var("SMTP_SERVER") {
            self.mail.smtp_server = server;
        }
        if let Some(port) = var("SMTP_PORT") {
            self.mail.smtp_port = parse_number("SMTP_PORT", &port)?;
        }
        if let Some(user) = var("GMAIL_USER") {
            self.mail.username = Some(user);
        }
        if let Some(password) = var("GMAIL_PASSWORD").or_else(|| var("GMAIL_APP_PASSWORD")) {
            self.mail.password = Some(password);
        }
        if let Some(list) = var("RECIPIENTS").or_else(|| var("RECIPIENT_EMAILS")) {
            self.mail.recipients = split_recipients(&list);
        }
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.source.url)?;
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.source.table_selector.trim().is_empty() {
            return Err(AppError::validation("source.table_selector is empty"));
        }
        parse_selector(&self.source.table_selector)?;
        if self.filter.qualifying_ratings.is_empty() {
            return Err(AppError::validation("filter.qualifying_ratings is empty"));
        }
        if let Some(r) = self.filter.qualifying_ratings.iter().find(|r| **r > 5) {
            return Err(AppError::validation(format!(
                "filter.qualifying_ratings contains {r}, ratings range 0-5"
            )));
        }
        if self.ledger.capacity == 0 {
            return Err(AppError::validation("ledger.capacity must be > 0"));
        }
        if self.ledger.recent_window == 0 {
            return Err(AppError::validation("ledger.recent_window must be > 0"));
        }
        Ok(())
    }

    /// Check that everything needed to send mail is present.
    pub fn validate_delivery(&self) -> Result<()> {
        let mut missing: Vec<String> = Vec::new();
        match self.mail.username.as_deref() {
            None | Some("") => missing.push("GMAIL_USER is not set".into()),
            Some(user) if user.parse::<Mailbox>().is_err() => {
                missing.push(format!("GMAIL_USER '{user}' is not a valid address"));
            }
            Some(_) => {}
        }
        if self.mail.password.as_deref().is_none_or(str::is_empty) {
            missing.push("GMAIL_PASSWORD is not set".into());
        }
        if self.mail.recipients.is_empty() {
            missing.push("RECIPIENTS is not set or invalid".into());
        }
        for recipient in &self.mail.recipients {
            if recipient.parse::<Mailbox>().is_err() {
                missing.push(format!("recipient '{recipient}' is not a valid address"));
            }
        }
        if self.mail.smtp_server.trim().is_empty() {
            missing.push("SMTP_SERVER is empty".into());
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::config(format!(
                "Email configuration error: {}",
                missing.join(", ")
            )))
        }
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::config(format!("{key} is not a valid number: {value}")))
}

/// Split a comma separated recipient list, dropping blanks.
pub fn split_recipients(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

/// Listing page and HTTP behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Listing page URL
    #[serde(default = "defaults::url")]
    pub url: String,

    /// Selector for the listing table
    #[serde(default = "defaults::table_selector")]
    pub table_selector: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Bound on the whole fetch in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: defaults::url(),
            table_selector: defaults::table_selector(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Header (or `data-label`) text of each logical column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnLabels {
    #[serde(default = "defaults::name_label")]
    pub name: String,
    #[serde(default = "defaults::status_label")]
    pub status: String,
    #[serde(default = "defaults::rating_label")]
    pub rating: String,
    #[serde(default = "defaults::gain_label")]
    pub estimated_gain: String,
    #[serde(default = "defaults::open_label")]
    pub open_date: String,
    #[serde(default = "defaults::close_label")]
    pub close_date: String,
}

impl Default for ColumnLabels {
    fn default() -> Self {
        Self {
            name: defaults::name_label(),
            status: defaults::status_label(),
            rating: defaults::rating_label(),
            estimated_gain: defaults::gain_label(),
            open_date: defaults::open_label(),
            close_date: defaults::close_label(),
        }
    }
}

/// Which status/date policy decides qualification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Literal "Open" status, scanning stops at the first closed row
    #[default]
    Status,
    /// Close date within today..=today + window_days, any status
    Window,
}

impl FromStr for FilterMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "status" => Ok(FilterMode::Status),
            "window" => Ok(FilterMode::Window),
            other => Err(AppError::config(format!(
                "Unknown filter mode '{other}', expected 'status' or 'window'"
            ))),
        }
    }
}

/// Qualification rule settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub mode: FilterMode,

    /// Days after today still inside the window (window mode)
    #[serde(default = "defaults::window_days")]
    pub window_days: u32,

    /// Ratings that qualify
    #[serde(default = "defaults::qualifying_ratings")]
    pub qualifying_ratings: Vec<u8>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            mode: FilterMode::default(),
            window_days: defaults::window_days(),
            qualifying_ratings: defaults::qualifying_ratings(),
        }
    }
}

/// Notification ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Ledger file location
    #[serde(default = "defaults::ledger_path")]
    pub path: PathBuf,

    /// Maximum number of remembered names
    #[serde(default = "defaults::capacity")]
    pub capacity: usize,

    /// How many recent names the report shows
    #[serde(default = "defaults::recent_window")]
    pub recent_window: usize,

    /// How long to wait for the ledger lock
    #[serde(default = "defaults::lock_timeout")]
    pub lock_timeout_secs: u64,

    /// Age after which a leftover lock file is considered abandoned
    #[serde(default = "defaults::lock_stale")]
    pub lock_stale_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: defaults::ledger_path(),
            capacity: defaults::capacity(),
            recent_window: defaults::recent_window(),
            lock_timeout_secs: defaults::lock_timeout(),
            lock_stale_secs: defaults::lock_stale(),
        }
    }
}

/// Mail transport settings. Credentials normally come from the environment.
#[derive(Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "defaults::smtp_server")]
    pub smtp_server: String,

    #[serde(default = "defaults::smtp_port")]
    pub smtp_port: u16,

    /// Sender account, also the visible recipient
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// Blind-copied recipients
    #[serde(default)]
    pub recipients: Vec<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_server: defaults::smtp_server(),
            smtp_port: defaults::smtp_port(),
            username: None,
            password: None,
            recipients: Vec::new(),
        }
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("recipients", &self.recipients.len())
            .finish()
    }
}

/// A link shown at the bottom of the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportLink {
    pub label: String,
    pub url: String,
}

/// Report wording settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Subject prefix when there is something new
    #[serde(default = "defaults::title")]
    pub title: String,

    #[serde(default = "defaults::links")]
    pub links: Vec<ReportLink>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: defaults::title(),
            links: defaults::links(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    use super::ReportLink;

    // Source defaults
    pub fn url() -> String {
        "https://www.investorgain.com/report/live-ipo-gmp/331/".into()
    }
    pub fn table_selector() -> String {
        "table#report_table".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; ipo-notifier/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Column defaults
    pub fn name_label() -> String {
        "IPO".into()
    }
    pub fn status_label() -> String {
        "Status".into()
    }
    pub fn rating_label() -> String {
        "Fire Rating".into()
    }
    pub fn gain_label() -> String {
        "Est Listing".into()
    }
    pub fn open_label() -> String {
        "Open".into()
    }
    pub fn close_label() -> String {
        "Close".into()
    }

    // Filter defaults
    pub fn window_days() -> u32 {
        3
    }
    pub fn qualifying_ratings() -> Vec<u8> {
        vec![4, 5]
    }

    // Ledger defaults
    pub fn ledger_path() -> PathBuf {
        PathBuf::from("notified_ipos.txt")
    }
    pub fn capacity() -> usize {
        10
    }
    pub fn recent_window() -> usize {
        5
    }
    pub fn lock_timeout() -> u64 {
        10
    }
    pub fn lock_stale() -> u64 {
        300
    }

    // Mail defaults
    pub fn smtp_server() -> String {
        "smtp.gmail.com".into()
    }
    pub fn smtp_port() -> u16 {
        587
    }

    // Report defaults
    pub fn title() -> String {
        "New Qualified IPOs".into()
    }
    pub fn links() -> Vec<ReportLink> {
        vec![
            ReportLink {
                label: "Apply on Groww".into(),
                url: "https://groww.in/ipo".into(),
            },
            ReportLink {
                label: "Apply on Dhan".into(),
                url: "https://dhan.co/ipo".into(),
            },
        ]
    }
}
