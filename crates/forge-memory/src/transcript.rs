//! Sled-backed transcript journal with one tree per calendar day.

use crate::MemoryError;
use async_trait::async_trait;
use chrono::NaiveDate;
use forge_session::{SinkError, TranscriptSink};
use forge_shared::TurnRecord;
use sled::Db;
use std::path::Path;

/// Append-only journal of conversation turns. Records land in a tree named
/// after their UTC day; keys sort chronologically within the tree.
pub struct TranscriptStore {
    db: Db,
}

impl TranscriptStore {
    /// Opens or creates the transcript DB at the given path.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, MemoryError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn tree_name(date: NaiveDate) -> String {
        format!("turns-{}", date.format("%Y-%m-%d"))
    }

    /// Appends one turn record under its own timestamp.
    pub fn append_record(&self, record: &TurnRecord) -> Result<(), MemoryError> {
        let tree = self
            .db
            .open_tree(Self::tree_name(record.timestamp.date_naive()))?;
        let key = format!("{}-{}", record.timestamp.to_rfc3339(), record.id);
        tree.insert(key.as_bytes(), serde_json::to_vec(record)?)?;
        Ok(())
    }

    /// Returns all records for one UTC day in insertion order. Entries that
    /// no longer deserialize are skipped.
    pub fn day(&self, date: NaiveDate) -> Result<Vec<TurnRecord>, MemoryError> {
        let tree = self.db.open_tree(Self::tree_name(date))?;
        let records = tree
            .iter()
            .values()
            .filter_map(|v| v.ok())
            .filter_map(|v| serde_json::from_slice(&v).ok())
            .collect();
        Ok(records)
    }
}

#[async_trait]
impl TranscriptSink for TranscriptStore {
    async fn append(&self, record: &TurnRecord) -> Result<(), SinkError> {
        self.append_record(record)?;
        Ok(())
    }
}
