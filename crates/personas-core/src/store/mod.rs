//! Record storage abstraction.
//!
//! The [`RecordStore`] trait is the read-only view the query core needs of
//! wherever personas are persisted (SQLite in the application crate, or
//! [`memory::InMemoryStore`] for tests and seeded deployments).
//!
//! Implementations must be `Send + Sync`; one store handle is shared by all
//! concurrent queries.

pub mod memory;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::matcher::match_terms;
use crate::record::Record;

/// Read access to stored records.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list_all`](RecordStore::list_all) | Every record, in store iteration order |
/// | [`get_by_id`](RecordStore::get_by_id) | One record by its id |
/// | [`find_matching`](RecordStore::find_matching) | Term filter with a cap, optionally pushed into the backend |
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records, in the store's stable iteration order.
    async fn list_all(&self) -> Result<Vec<Record>, StoreError>;

    /// A single record by id, or `None` if absent.
    async fn get_by_id(&self, id: &str) -> Result<Option<Record>, StoreError>;

    /// Records whose search text contains any of `terms`, at most `cap`,
    /// in iteration order.
    ///
    /// `terms` are already lower-cased (see [`query_terms`](crate::matcher::query_terms)).
    /// Backends with a query engine override this to filter server-side;
    /// overrides must return exactly what the default returns.
    async fn find_matching(&self, terms: &[String], cap: usize) -> Result<Vec<Record>, StoreError> {
        if terms.is_empty() || cap == 0 {
            return Ok(Vec::new());
        }
        let all = self.list_all().await?;
        Ok(match_terms(terms, &all, cap))
    }
}
