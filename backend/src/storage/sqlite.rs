//! SQLite-backed ledger document store.
//!
//! Documents are held as JSON bodies in a single table keyed by
//! `(collection, id)`, with the event timestamp mirrored into an indexed
//! column so range queries never parse JSON. Timestamps are always bound
//! as `DateTime<Utc>` so the stored text format stays uniform and
//! comparable.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{migrate::MigrateDatabase, Row, Sqlite, SqlitePool};

use super::traits::{LedgerStore, RawRecord, UpperBound};

#[derive(Clone)]
pub struct SqliteLedgerStore {
    pool: SqlitePool,
}

impl SqliteLedgerStore {
    pub async fn connect(url: &str) -> Result<Self> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?;
        }

        let pool = SqlitePool::connect(url).await?;
        Self::setup_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Open a fresh shared in-memory database for a single test.
    #[cfg(test)]
    pub async fn connect_test() -> Result<Self> {
        let test_id = uuid::Uuid::new_v4().to_string();
        Self::connect(&format!("file:memdb_{test_id}?mode=memory&cache=shared")).await
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection  TEXT NOT NULL,
                id          TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                body        TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_documents_collection_recorded_at
                ON documents (collection, recorded_at);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Insert or replace a document. The audit API itself never writes
    /// to the store; tests seed through this hook.
    #[cfg(test)]
    pub async fn put_document(
        &self,
        collection: &str,
        id: &str,
        recorded_at: DateTime<Utc>,
        fields: &Map<String, Value>,
    ) -> Result<()> {
        let body = serde_json::to_string(fields)?;
        sqlx::query(
            "INSERT OR REPLACE INTO documents (collection, id, recorded_at, body) VALUES (?, ?, ?, ?)",
        )
        .bind(collection)
        .bind(id)
        .bind(recorded_at)
        .bind(body)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn fetch_range(
        &self,
        collection: &str,
        from: DateTime<Utc>,
        until: UpperBound,
        newest_first: bool,
    ) -> Result<Vec<RawRecord>> {
        let (comparator, end) = match until {
            UpperBound::Inclusive(end) => ("<=", end),
            UpperBound::Exclusive(end) => ("<", end),
        };
        let order = if newest_first { "DESC" } else { "ASC" };
        let sql = format!(
            "SELECT id, body FROM documents \
             WHERE collection = ? AND recorded_at >= ? AND recorded_at {comparator} ? \
             ORDER BY recorded_at {order}"
        );

        let rows = sqlx::query(&sql)
            .bind(collection)
            .bind(from)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("range query on collection '{collection}' failed"))?;

        rows.into_iter()
            .map(|row| {
                let id: String = row.get("id");
                let body: String = row.get("body");
                let fields: Map<String, Value> = serde_json::from_str(&body)
                    .with_context(|| format!("document '{id}' holds malformed JSON"))?;
                Ok(RawRecord::new(id, fields))
            })
            .collect()
    }
}
