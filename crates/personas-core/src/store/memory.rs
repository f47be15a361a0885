//! In-memory [`RecordStore`] for tests and seeded deployments.
//!
//! Records live in a `Vec` behind `std::sync::RwLock`; iteration order is
//! insertion order.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::Record;

use super::RecordStore;

/// In-memory store keyed by record id.
pub struct InMemoryStore {
    records: RwLock<Vec<(String, Record)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Builds a store from `(id, record)` pairs, keeping their order.
    pub fn from_records(records: impl IntoIterator<Item = (String, Record)>) -> Self {
        let store = Self::new();
        for (id, record) in records {
            store.insert(id, record);
        }
        store
    }

    /// Inserts a record, replacing in place if the id already exists.
    pub fn insert(&self, id: impl Into<String>, record: Record) {
        let id = id.into();
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        match records.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = record,
            None => records.push((id, record)),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))?;
        Ok(records.iter().map(|(_, r)| r.clone()).collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))?;
        Ok(records
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, r)| r.clone()))
    }
}
