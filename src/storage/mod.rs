//! Ledger persistence.
//!
//! The ledger lives in a single text file, one notified name per line,
//! oldest first:
//!
//! ```text
//! notified_ipos.txt        # ledger
//! notified_ipos.txt.tmp    # in-flight write, renamed over the ledger
//! notified_ipos.txt.lock   # held while a commit is in progress
//! ```

pub mod ledger;
pub mod local;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use ledger::NotificationLedger;
pub use local::LocalLedgerStore;

/// Trait for ledger storage backends.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load the persisted ledger. Missing state yields an empty ledger.
    async fn load(&self) -> Result<NotificationLedger>;

    /// Persist the ledger, replacing previous state atomically.
    async fn save(&self, ledger: &NotificationLedger) -> Result<()>;

    /// Record delivered names against the latest persisted state and save.
    ///
    /// Implementations must hold exclusive access across the re-load, merge
    /// and save so that concurrent commits cannot lose each other's names.
    async fn commit(&self, names: &[String]) -> Result<NotificationLedger>;
}
