//! Local filesystem ledger store.
//!
//! Writes go to a sibling `.tmp` file which is then renamed over the ledger,
//! so an interrupted write leaves the previous ledger intact. Commits and
//! saves hold a `.lock` file created with `create_new`; a lock older than
//! the configured stale age is assumed abandoned by a crashed run.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;

use crate::error::{AppError, Result};
use crate::models::LedgerConfig;
use crate::storage::{LedgerStore, NotificationLedger};

/// Pause between lock attempts.
const LOCK_RETRY: Duration = Duration::from_millis(100);

/// File-backed ledger store.
#[derive(Debug, Clone)]
pub struct LocalLedgerStore {
    path: PathBuf,
    capacity: usize,
    lock_timeout: Duration,
    lock_stale: Duration,
}

impl LocalLedgerStore {
    /// Create a store for the ledger file at `path`.
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        let defaults = LedgerConfig::default();
        Self {
            path: path.into(),
            capacity,
            lock_timeout: Duration::from_secs(defaults.lock_timeout_secs),
            lock_stale: Duration::from_secs(defaults.lock_stale_secs),
        }
    }

    /// Create a store from the ledger section of the configuration.
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self {
            path: config.path.clone(),
            capacity: config.capacity,
            lock_timeout: Duration::from_secs(config.lock_timeout_secs),
            lock_stale: Duration::from_secs(config.lock_stale_secs),
        }
    }

    /// Override lock timing.
    pub fn with_lock_timing(mut self, timeout: Duration, stale_after: Duration) -> Self {
        self.lock_timeout = timeout;
        self.lock_stale = stale_after;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }

    fn lock_path(&self) -> PathBuf {
        self.sibling(".lock")
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write the ledger atomically (write to temp, then rename).
    async fn write_ledger(&self, ledger: &NotificationLedger) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.sibling(".tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(ledger.to_text().as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn read_ledger(&self) -> Result<NotificationLedger> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(NotificationLedger::parse(&text, self.capacity)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(NotificationLedger::new(self.capacity)),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn acquire_lock(&self) -> Result<LedgerLock> {
        self.ensure_dir().await?;
        LedgerLock::acquire(self.lock_path(), self.lock_timeout, self.lock_stale).await
    }
}

#[async_trait]
impl LedgerStore for LocalLedgerStore {
    async fn load(&self) -> Result<NotificationLedger> {
        let ledger = self.read_ledger().await?;
        if ledger.is_empty() {
            log::info!("No notified IPOs on record at {}", self.path.display());
        } else {
            log::info!(
                "Loaded {} notified IPOs from {}",
                ledger.len(),
                self.path.display()
            );
        }
        Ok(ledger)
    }

    async fn save(&self, ledger: &NotificationLedger) -> Result<()> {
        let _lock = self.acquire_lock().await?;
        self.write_ledger(ledger).await?;
        log::info!("Saved {} IPOs to {}", ledger.len(), self.path.display());
        Ok(())
    }

    async fn commit(&self, names: &[String]) -> Result<NotificationLedger> {
        let _lock = self.acquire_lock().await?;

        let mut ledger = self.read_ledger().await?;
        let added = ledger.record(names);
        self.write_ledger(&ledger).await?;

        log::info!(
            "Committed {} new IPOs, ledger holds {}/{}",
            added,
            ledger.len(),
            ledger.capacity()
        );
        Ok(ledger)
    }
}

/// Exclusive lock file, removed on drop.
#[derive(Debug)]
struct LedgerLock {
    path: PathBuf,
}

impl LedgerLock {
    async fn acquire(path: PathBuf, timeout: Duration, stale_after: Duration) -> Result<Self> {
        let deadline = Instant::now() + timeout;

        loop {
            let attempt = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            match attempt {
                Ok(file) => {
                    let lock = Self { path };
                    lock.write_owner(file).await?;
                    return Ok(lock);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if Self::is_stale(&path, stale_after).await {
                        log::warn!("Removing abandoned ledger lock {}", path.display());
                        match tokio::fs::remove_file(&path).await {
                            Ok(()) => continue,
                            Err(e) if e.kind() == ErrorKind::NotFound => continue,
                            Err(e) => return Err(AppError::Io(e)),
                        }
                    }
                    if Instant::now() >= deadline {
                        return Err(AppError::lock(format!(
                            "{} still held after {}s",
                            path.display(),
                            timeout.as_secs()
                        )));
                    }
                    tokio::time::sleep(LOCK_RETRY).await;
                }
                Err(e) => return Err(AppError::Io(e)),
            }
        }
    }

    /// Record the holding process. On failure `self` drops and removes the file.
    async fn write_owner(&self, mut file: tokio::fs::File) -> Result<()> {
        let pid = format!("{}\n", std::process::id());
        file.write_all(pid.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn is_stale(path: &Path, stale_after: Duration) -> bool {
        tokio::fs::metadata(path)
            .await
            .ok()
            .and_then(|meta| meta.modified().ok())
            .and_then(|modified| modified.elapsed().ok())
            .is_some_and(|age| age > stale_after)
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::warn!("Failed to release ledger lock {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(tmp: &TempDir, capacity: usize) -> LocalLedgerStore {
        LocalLedgerStore::new(tmp.path().join("notified_ipos.txt"), capacity)
    }

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_load_missing_is_empty() {
        let tmp = TempDir::new().unwrap();
        let ledger = store(&tmp, 10).load().await.unwrap();
        assert!(ledger.is_empty());
        assert_eq!(ledger.capacity(), 10);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp, 10);

        let ledger = NotificationLedger::from_names(["Acme IPO", "Beta SME"], 10);
        store.save(&ledger).await.unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text, "Acme IPO\nBeta SME\n");
        assert_eq!(store.load().await.unwrap(), ledger);
        assert!(!store.lock_path().exists());
        assert!(!store.sibling(".tmp").exists());
    }

    #[tokio::test]
    async fn test_commit_merges_with_persisted_state() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp, 3);

        store.commit(&strings(&["A", "B"])).await.unwrap();
        let ledger = store.commit(&strings(&["B", "C", "D"])).await.unwrap();

        assert_eq!(ledger.names().collect::<Vec<_>>(), vec!["B", "C", "D"]);
        assert_eq!(store.load().await.unwrap(), ledger);
    }

    #[tokio::test]
    async fn test_commit_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let store = LocalLedgerStore::new(tmp.path().join("state/nested/ledger.txt"), 5);

        store.commit(&strings(&["Acme"])).await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_held_lock_times_out() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp, 5)
            .with_lock_timing(Duration::from_millis(250), Duration::from_secs(3600));
        std::fs::write(store.lock_path(), "4242\n").unwrap();

        let result = store.commit(&strings(&["Acme"])).await;
        assert!(matches!(result, Err(AppError::Lock(_))));
        assert!(!store.path().exists());
        // Someone else's lock is left alone.
        assert!(store.lock_path().exists());
    }

    #[tokio::test]
    async fn test_stale_lock_is_reclaimed() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp, 5).with_lock_timing(Duration::from_secs(1), Duration::ZERO);
        std::fs::write(store.lock_path(), "4242\n").unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        store.commit(&strings(&["Acme"])).await.unwrap();
        assert_eq!(store.load().await.unwrap().len(), 1);
        assert!(!store.lock_path().exists());
    }

    #[tokio::test]
    async fn test_concurrent_commits_keep_all_names() {
        let tmp = TempDir::new().unwrap();
        let first = store(&tmp, 10);
        let second = store(&tmp, 10);

        let a = strings(&["A1", "A2"]);
        let b = strings(&["B1", "B2"]);
        let (ra, rb) = tokio::join!(first.commit(&a), second.commit(&b));
        ra.unwrap();
        rb.unwrap();

        let ledger = first.load().await.unwrap();
        assert_eq!(ledger.len(), 4);
        for name in ["A1", "A2", "B1", "B2"] {
            assert!(ledger.contains(name));
        }
    }

    #[tokio::test]
    async fn test_lock_records_owner_and_releases_on_drop() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ledger.txt.lock");

        let lock = LedgerLock::acquire(path.clone(), Duration::from_secs(1), Duration::from_secs(60))
            .await
            .unwrap();
        let owner = std::fs::read_to_string(&path).unwrap();
        assert_eq!(owner.trim(), std::process::id().to_string());

        drop(lock);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_lock_removed_when_owner_write_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ledger.txt.lock");
        std::fs::write(&path, "").unwrap();
        let read_only = tokio::fs::File::open(&path).await.unwrap();

        let lock = LedgerLock { path: path.clone() };
        assert!(lock.write_owner(read_only).await.is_err());
        drop(lock);

        assert!(!path.exists());
    }
}
