//! In-memory `LedgerStore` used by unit tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::traits::{LedgerStore, RawRecord, UpperBound};

#[derive(Default)]
pub struct MemoryLedgerStore {
    collections: Mutex<HashMap<String, Vec<(DateTime<Utc>, RawRecord)>>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, collection: &str, recorded_at: DateTime<Utc>, record: RawRecord) {
        self.collections
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .push((recorded_at, record));
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn fetch_range(
        &self,
        collection: &str,
        from: DateTime<Utc>,
        until: UpperBound,
        newest_first: bool,
    ) -> Result<Vec<RawRecord>> {
        let collections = self.collections.lock().await;
        let mut matching: Vec<(DateTime<Utc>, RawRecord)> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(recorded_at, _)| {
                        *recorded_at >= from
                            && match until {
                                UpperBound::Inclusive(end) => *recorded_at <= end,
                                UpperBound::Exclusive(end) => *recorded_at < end,
                            }
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        matching.sort_by_key(|(recorded_at, _)| *recorded_at);
        if newest_first {
            matching.reverse();
        }
        Ok(matching.into_iter().map(|(_, record)| record).collect())
    }
}
