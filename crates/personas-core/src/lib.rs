//! # Personas Core
//!
//! Pure query logic for the personas service: record model, term matching,
//! answer composition, the query pipeline, and the collaborator traits it
//! runs against (record store, text generator).
//!
//! This crate contains no tokio, sqlx, HTTP clients, or filesystem I/O.
//! Native backends live in the `personas-query` application crate.
//!
//! ```text
//! query ──▶ RecordStore::list_all ──▶ matcher ──▶ AnswerComposer ──▶ QueryOutcome
//!                                                      │
//!                                                      ▼
//!                                                  Generator
//! ```

pub mod compose;
pub mod error;
pub mod generation;
pub mod matcher;
pub mod pipeline;
pub mod record;
pub mod store;

pub use compose::{AnswerComposer, PromptTemplate};
pub use error::{GenerationError, QueryError, StoreError};
pub use generation::{GenerationOptions, Generator};
pub use matcher::{match_records, match_terms, query_terms, DEFAULT_MATCH_CAP};
pub use pipeline::{MatchStrategy, PipelineOptions, QueryOutcome, QueryPipeline};
pub use record::Record;
pub use store::{memory::InMemoryStore, RecordStore};
