//! SQLite-backed [`RecordStore`] implementation.
//!
//! Each persona is one row holding its JSON body plus a precomputed
//! lower-cased `search_text`, so the term filter can run inside SQLite
//! (`find_matching`) with exactly the semantics of the in-memory scan.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use personas_core::{Record, RecordStore, StoreError};

use crate::config::StoreConfig;
use crate::{db, migrate};

/// SQLite implementation of the [`RecordStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects and makes sure the schema exists.
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::create_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Inserts or replaces a record. A replaced record keeps its position
    /// in iteration order.
    pub async fn upsert(&self, id: &str, record: &Record) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO personas (id, data_json, search_text, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                data_json = excluded.data_json,
                search_text = excluded.search_text,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(serde_json::to_string(record)?)
        .bind(record.search_text())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM personas")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn decode_row(row: &SqliteRow) -> Result<Record, StoreError> {
    let id: String = row.try_get("id").map_err(unavailable)?;
    let data: String = row.try_get("data_json").map_err(unavailable)?;
    let value: serde_json::Value = serde_json::from_str(&data)
        .map_err(|e| StoreError::Malformed(format!("persona {}: {}", id, e)))?;
    Record::try_from(value)
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        let rows = sqlx::query("SELECT id, data_json FROM personas ORDER BY seq")
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;
        rows.iter().map(decode_row).collect()
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let row = sqlx::query("SELECT id, data_json FROM personas WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn find_matching(&self, terms: &[String], cap: usize) -> Result<Vec<Record>, StoreError> {
        if terms.is_empty() || cap == 0 {
            return Ok(Vec::new());
        }

        // Terms travel as one JSON array parameter so the statement size does
        // not grow with the query. instr() is plain substring containment and
        // both sides are already lower-cased.
        let terms_json = serde_json::to_string(terms)
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        let rows = sqlx::query(
            r#"
            SELECT id, data_json FROM personas
            WHERE EXISTS (
                SELECT 1 FROM json_each(?) AS t
                WHERE instr(personas.search_text, t.value) > 0
            )
            ORDER BY seq
            LIMIT ?
            "#,
        )
        .bind(terms_json)
        .bind(cap as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.iter().map(decode_row).collect()
    }
}
