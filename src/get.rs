//! Record retrieval by id.
//!
//! Used by the `personas get` CLI command and `GET /personas/{id}`.

use anyhow::{bail, Result};

use personas_core::{Record, RecordStore};

use crate::config::Config;
use crate::services::open_store;

/// Fetches one record, failing with "not found" if it is absent.
pub async fn get_record(store: &dyn RecordStore, id: &str) -> Result<Record> {
    match store.get_by_id(id).await? {
        Some(record) => Ok(record),
        None => bail!("persona not found: {}", id),
    }
}

/// CLI entry point: prints the record as pretty JSON.
pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let store = open_store(config).await?;
    let record = get_record(store.as_ref(), id).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
