//! Error taxonomy for the query core.
//!
//! Store and generation failures stay distinguishable up to the pipeline
//! boundary so callers can log them by kind before collapsing them into a
//! single user-visible error.

use thiserror::Error;

/// Failure to read records from a [`RecordStore`](crate::store::RecordStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Failure of the external text-generation service.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation service unavailable: {0}")]
    Unavailable(String),
    #[error("malformed generation response: {0}")]
    Malformed(String),
    #[error("generation service timed out: {0}")]
    Timeout(String),
    #[error("generation provider is disabled")]
    Disabled,
}

/// Any failure of a [`QueryPipeline`](crate::pipeline::QueryPipeline) call.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl QueryError {
    /// Short machine-readable kind, used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::Store(_) => "store",
            QueryError::Generation(_) => "generation",
        }
    }
}
