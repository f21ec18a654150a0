//! Record table
//!
//! Persisted as JSON, sorted by descending score. Ties keep the older record
//! first.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::runner::ScoreKeeper;

/// Default maximum number of records kept
pub const MAX_RECORDS: usize = 512;

/// The outcome of one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub score: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTable {
    pub entries: Vec<Record>,
    capacity: usize,
}

impl Default for RecordTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordTable {
    pub fn new() -> Self {
        Self::with_capacity(MAX_RECORDS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Check if a score would enter the table
    pub fn qualifies(&self, score: u64) -> bool {
        if self.entries.len() < self.capacity {
            return true;
        }
        self.entries.last().is_some_and(|e| score > e.score)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a record if it qualifies
    ///
    /// Returns the rank achieved (1-indexed).
    pub fn add_record(&mut self, name: impl Into<String>, score: u64) -> Option<usize> {
        let rank = self.potential_rank(score)?;
        self.entries.insert(
            rank - 1,
            Record {
                name: name.into(),
                score,
            },
        );
        self.entries.truncate(self.capacity);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load a table from disk; a missing file gives an empty table
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No record table found, starting fresh");
                return Ok(Self::new());
            }
            Err(e) => return Err(Error::io(path, e)),
        };
        let table: RecordTable = serde_json::from_str(&json).map_err(|e| Error::json(path, e))?;
        log::info!("Loaded {} records", table.entries.len());
        Ok(table)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::json(path, e))?;
        fs::write(path, json).map_err(|e| Error::io(path, e))?;
        log::info!("Record table saved ({} entries)", self.entries.len());
        Ok(())
    }
}

impl ScoreKeeper for RecordTable {
    fn register(&mut self, name: &str, score: u64) -> Option<usize> {
        self.add_record(name, score)
    }
}
