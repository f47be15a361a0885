use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(&config.store).await?;
    create_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Creates the personas table. Idempotent.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // `seq` fixes the store iteration order; `search_text` is the lower-cased
    // haystack used by pushed-down term filters.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS personas (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            data_json TEXT NOT NULL,
            search_text TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
