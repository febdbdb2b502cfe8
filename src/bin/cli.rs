//! IPO Notifier CLI
//!
//! Local execution entry point, meant to be run on a schedule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ipo_notifier::{
    error::Result,
    models::{Config, FilterMode},
    pipeline::Orchestrator,
    services::{HttpPageSource, LogSink, NotificationSink, SmtpSink, TableRowAccessor},
    storage::{LedgerStore, LocalLedgerStore},
};

/// IPO Notifier - mails newly qualifying IPOs
#[derive(Parser, Debug)]
#[command(
    name = "ipo-notifier",
    version,
    about = "Scrapes a live IPO listing and mails newly qualifying offerings"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, qualify, notify and record
    Run {
        /// Log the report instead of mailing it, and leave the ledger alone
        #[arg(long)]
        dry_run: bool,

        /// Override the configured qualification policy
        #[arg(long, value_parser = parse_mode)]
        mode: Option<FilterMode>,
    },

    /// Validate configuration
    Validate,

    /// Show the notification ledger
    Ledger,
}

fn parse_mode(s: &str) -> std::result::Result<FilterMode, String> {
    s.parse().map_err(|e: ipo_notifier::error::AppError| e.to_string())
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("IPO Notifier starting...");

    let mut config = Config::load_or_default(&cli.config)?;
    config.apply_env()?;

    log::info!("Loaded configuration from {}", cli.config.display());

    let store = LocalLedgerStore::from_config(&config.ledger);

    match cli.command {
        Command::Run { dry_run, mode } => {
            if let Some(mode) = mode {
                config.filter.mode = mode;
            }
            config.validate()?;
            if !dry_run {
                config.validate_delivery()?;
            }

            let page_source = HttpPageSource::from_config(&config.source)?;
            let rows = TableRowAccessor::new(&config.source.table_selector, config.columns.clone());
            let sink: Box<dyn NotificationSink> = if dry_run {
                Box::new(LogSink)
            } else {
                Box::new(SmtpSink::from_config(&config.mail)?)
            };

            let mut orchestrator =
                Orchestrator::new(&config, &page_source, &rows, sink.as_ref(), &store);
            if dry_run {
                orchestrator = orchestrator.dry_run();
            }

            let outcome = orchestrator.run().await?;
            log::info!("Run finished: {}", outcome);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
            log::info!("  Source: {}", config.source.url);
            log::info!(
                "  Filter: {:?} mode, window {} days, ratings {:?}",
                config.filter.mode,
                config.filter.window_days,
                config.filter.qualifying_ratings
            );
            log::info!(
                "  Ledger: {} (capacity {})",
                config.ledger.path.display(),
                config.ledger.capacity
            );

            match config.validate_delivery() {
                Ok(()) => log::info!(
                    "✓ Mail OK ({} recipients via {}:{})",
                    config.mail.recipients.len(),
                    config.mail.smtp_server,
                    config.mail.smtp_port
                ),
                Err(e) => log::warn!("{} (only --dry-run will work)", e),
            }
        }

        Command::Ledger => {
            let ledger = store.load().await?;
            log::info!("Ledger file: {}", store.path().display());
            log::info!("Entries: {}/{}", ledger.len(), ledger.capacity());
            if ledger.is_empty() {
                log::info!("No IPOs notified yet.");
            }
            for (i, name) in ledger.recent(ledger.len()).into_iter().enumerate() {
                log::info!("  {:>2}. {}", i + 1, name);
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
