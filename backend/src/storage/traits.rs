//! Storage abstraction for the ledger document store.
//!
//! The audit API is read-only: the only operation the domain layer needs
//! is a ranged, ordered fetch of raw documents from a named collection.
//! Implementations decide how documents are actually held (SQLite table,
//! in-memory map for tests).

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// A raw document as stored: an identifier plus an untyped field map.
/// Fields may be absent, mistyped, or use legacy names; the normalizer
/// is responsible for making sense of them.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl RawRecord {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self { id: id.into(), fields }
    }
}

/// Upper bound of a range query. Listing endpoints use an inclusive
/// bound; the daily summary uses an exclusive next-day bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpperBound {
    Inclusive(DateTime<Utc>),
    Exclusive(DateTime<Utc>),
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Fetch every document in `collection` whose timestamp falls in
    /// `[from, until]` / `[from, until)`. The full matching set is
    /// returned; pagination is applied by the caller.
    async fn fetch_range(
        &self,
        collection: &str,
        from: DateTime<Utc>,
        until: UpperBound,
        newest_first: bool,
    ) -> Result<Vec<RawRecord>>;
}
