//! Bounded record of offering names that were already notified.

use std::collections::VecDeque;

/// FIFO-bounded set of notified names, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationLedger {
    entries: VecDeque<String>,
    capacity: usize,
}

impl NotificationLedger {
    /// Create an empty ledger. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Build a ledger from names in insertion order.
    pub fn from_names<I, S>(names: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ledger = Self::new(capacity);
        ledger.record(names);
        ledger
    }

    /// Parse the newline-delimited file format.
    pub fn parse(text: &str, capacity: usize) -> Self {
        Self::from_names(text.lines(), capacity)
    }

    /// Serialize to the newline-delimited file format, oldest first.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for name in &self.entries {
            text.push_str(name);
            text.push('\n');
        }
        text
    }

    /// Merge names into the ledger.
    ///
    /// Names already present keep their original position. Once the ledger
    /// grows past capacity the oldest entries are evicted. Returns how many
    /// names were newly added.
    pub fn record<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() || self.contains(name) {
                continue;
            }
            self.entries.push_back(name.to_string());
            added += 1;
        }

        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                log::debug!("Ledger full, evicting '{}'", evicted);
            }
        }

        added
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry == name)
    }

    /// Up to `n` most recently recorded names, newest first.
    pub fn recent(&self, n: usize) -> Vec<&str> {
        self.entries.iter().rev().take(n).map(String::as_str).collect()
    }

    /// Names in insertion order, oldest first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
