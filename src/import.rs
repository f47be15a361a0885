//! Bulk import of personas from a JSON file.
//!
//! The file holds a JSON array of objects. Each object becomes one record;
//! its id is taken from `store.id_field` (default `numero_documento`). When
//! that field is missing the id is the 1-based position in the file with a
//! `_` prefix (`_3`), which cannot clash with a document number.
//!
//! Every imported record is reported to the audit log as `CREATE` (new id)
//! or `UPDATE` (existing id).

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;

use personas_core::{Record, RecordStore};

use crate::config::{Config, StoreBackend};
use crate::event_log::{create_event_log, emit, LogEvent};
use crate::sqlite_store::SqliteStore;

/// Reads `(id, record)` pairs from a JSON array file, in file order.
pub fn load_records_file(path: &Path, id_field: &str) -> Result<Vec<(String, Record)>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read records file: {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse records file: {}", path.display()))?;

    let items = match value {
        Value::Array(items) => items,
        _ => bail!("{}: expected a JSON array of objects", path.display()),
    };

    let mut records = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let record = Record::try_from(item)
            .with_context(|| format!("{}: entry {}", path.display(), i + 1))?;
        let id = match record.get(id_field) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => positional_id(i),
        };
        records.push((id, record));
    }
    Ok(records)
}

fn positional_id(index: usize) -> String {
    format!("_{}", index + 1)
}

fn describe(record: &Record) -> String {
    let field = |name: &str| record.get_text(name).unwrap_or_default();
    format!("{} {}", field("primer_nombre"), field("apellidos"))
        .trim()
        .to_string()
}

/// Imports a records file into the SQLite store. Returns the record count.
pub async fn run_import(config: &Config, path: &Path) -> Result<usize> {
    if config.store.backend != StoreBackend::Sqlite {
        bail!("import requires store.backend = \"sqlite\"; the memory backend loads store.seed at startup");
    }

    let records = load_records_file(path, &config.store.id_field)?;
    let store = SqliteStore::open(&config.store).await?;
    let event_log = create_event_log(&config.log_service)?;

    let mut created = 0usize;
    for (id, record) in &records {
        let existed = store.get_by_id(id).await?.is_some();
        store
            .upsert(id, record)
            .await
            .with_context(|| format!("Failed to store persona {}", id))?;

        let event = if existed {
            LogEvent::new("UPDATE", id.as_str(), format!("Actualización de persona: {}", describe(record)))
        } else {
            created += 1;
            LogEvent::new("CREATE", id.as_str(), format!("Creación de persona: {}", describe(record)))
        };
        emit(event_log.as_ref(), event).await;
    }

    tracing::info!(
        total = records.len(),
        created,
        updated = records.len() - created,
        "import finished"
    );
    store.pool().close().await;
    Ok(records.len())
}
