//! Raw table rows as handed over by the row accessor.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical columns of the listing table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Column {
    Name,
    Status,
    Rating,
    EstimatedGain,
    OpenDate,
    CloseDate,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Status,
        Column::Rating,
        Column::Name,
        Column::EstimatedGain,
        Column::OpenDate,
        Column::CloseDate,
    ];
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Column::Name => "name",
            Column::Status => "status",
            Column::Rating => "rating",
            Column::EstimatedGain => "estimated_gain",
            Column::OpenDate => "open_date",
            Column::CloseDate => "close_date",
        };
        f.write_str(label)
    }
}

/// One raw table row: logical column to cell text. Any column may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    cells: HashMap<Column, String>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: Column, text: impl Into<String>) -> Self {
        self.insert(column, text);
        self
    }

    /// Set a cell, keeping the first value when a column repeats.
    pub fn insert(&mut self, column: Column, text: impl Into<String>) {
        self.cells.entry(column).or_insert_with(|| text.into());
    }

    pub fn get(&self, column: Column) -> Option<&str> {
        self.cells.get(&column).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
