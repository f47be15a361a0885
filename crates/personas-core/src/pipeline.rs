//! The query pipeline: fetch, filter, compose.
//!
//! [`QueryPipeline::handle`] is the single operation the HTTP surface and
//! CLI expose. It is built once from explicit collaborators and shared by
//! every request; it holds no mutable state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::compose::AnswerComposer;
use crate::error::QueryError;
use crate::matcher::{match_records, DEFAULT_MATCH_CAP};
use crate::record::Record;
use crate::store::RecordStore;

/// Where the term filter runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Load every record and filter in memory.
    #[default]
    Scan,
    /// Let the store filter via [`RecordStore::find_matching`].
    Pushdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Maximum records handed to the generator.
    pub cap: usize,
    pub strategy: MatchStrategy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            cap: DEFAULT_MATCH_CAP,
            strategy: MatchStrategy::Scan,
        }
    }
}

/// Result of one query, in the wire shape of the HTTP response.
///
/// `relevant_data` is `None` (serialized as `null`) when nothing matched,
/// never an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub answer: String,
    pub relevant_data: Option<Vec<Record>>,
}

pub struct QueryPipeline {
    store: Arc<dyn RecordStore>,
    composer: AnswerComposer,
    options: PipelineOptions,
}

impl QueryPipeline {
    pub fn new(store: Arc<dyn RecordStore>, composer: AnswerComposer) -> Self {
        Self {
            store,
            composer,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Name of the generator answers come from.
    pub fn generator_name(&self) -> &str {
        self.composer.generator_name()
    }

    /// Answers a free-text query.
    ///
    /// Any store or generation failure aborts the whole call; no answer is
    /// produced from a partially failed pipeline.
    pub async fn handle(&self, query: &str) -> Result<QueryOutcome, QueryError> {
        let (answer, matches) = match self.options.strategy {
            MatchStrategy::Scan => {
                let all = self.store.list_all().await?;
                let matches = match_records(query, &all, self.options.cap);
                let answer = self.composer.compose(query, &matches).await?;
                (answer, matches)
            }
            MatchStrategy::Pushdown => {
                self.composer
                    .compose_structured(query, self.store.as_ref(), self.options.cap)
                    .await?
            }
        };

        Ok(QueryOutcome {
            answer,
            relevant_data: if matches.is_empty() {
                None
            } else {
                Some(matches)
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GenerationError, StoreError};
    use crate::generation::{GenerationOptions, Generator};
    use crate::store::memory::InMemoryStore;
    use async_trait::async_trait;

    enum Stub {
        Answer(&'static str),
        Timeout,
    }

    #[async_trait]
    impl Generator for Stub {
        fn name(&self) -> &str {
            "stub"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<String, GenerationError> {
            match self {
                Stub::Answer(a) => Ok(a.to_string()),
                Stub::Timeout => Err(GenerationError::Timeout("no response within 30s".into())),
            }
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl RecordStore for BrokenStore {
        async fn list_all(&self) -> Result<Vec<Record>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn get_by_id(&self, _id: &str) -> Result<Option<Record>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    fn persona(nombre: &str, apellidos: &str) -> Record {
        Record::new()
            .with("primer_nombre", nombre)
            .with("apellidos", apellidos)
    }

    fn pipeline(records: Vec<Record>, generator: Stub) -> QueryPipeline {
        let store = InMemoryStore::from_records(
            records
                .into_iter()
                .enumerate()
                .map(|(i, r)| (i.to_string(), r)),
        );
        QueryPipeline::new(Arc::new(store), AnswerComposer::new(Arc::new(generator)))
    }

    #[tokio::test]
    async fn test_end_to_end_match() {
        let p = pipeline(
            vec![persona("Maria", "Lopez"), persona("Juan", "Perez")],
            Stub::Answer("Found Maria Lopez"),
        );
        let outcome = p.handle("maria").await.unwrap();
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            serde_json::json!({
                "answer": "Found Maria Lopez",
                "relevant_data": [{"primer_nombre": "Maria", "apellidos": "Lopez"}]
            })
        );
    }

    #[tokio::test]
    async fn test_empty_store_reports_absent_data() {
        let p = pipeline(vec![], Stub::Answer("No hay datos"));
        let outcome = p.handle("maria").await.unwrap();
        assert_eq!(outcome.answer, "No hay datos");
        assert_eq!(outcome.relevant_data, None);
        assert_eq!(
            serde_json::to_value(&outcome).unwrap()["relevant_data"],
            serde_json::Value::Null
        );
    }

    #[tokio::test]
    async fn test_generation_timeout_fails_whole_call() {
        let p = pipeline(vec![persona("Maria", "Lopez")], Stub::Timeout);
        let err = p.handle("maria").await.unwrap_err();
        assert_eq!(err.kind(), "generation");
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_store_error() {
        let p = QueryPipeline::new(
            Arc::new(BrokenStore),
            AnswerComposer::new(Arc::new(Stub::Answer("unused"))),
        );
        let err = p.handle("maria").await.unwrap_err();
        assert!(matches!(err, QueryError::Store(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_cap_applies_through_pipeline() {
        let records: Vec<Record> = (0..10).map(|i| persona(&format!("Ana{}", i), "Gomez")).collect();
        let p = pipeline(records.clone(), Stub::Answer("ok"));
        let outcome = p.handle("gomez").await.unwrap();
        assert_eq!(outcome.relevant_data, Some(records[..5].to_vec()));
    }

    #[tokio::test]
    async fn test_pushdown_matches_scan() {
        let records = vec![
            persona("Maria", "Lopez"),
            persona("Juan", "Perez"),
            persona("Mariana", "Diaz"),
        ];
        let scan = pipeline(records.clone(), Stub::Answer("ok"));
        let push = pipeline(records, Stub::Answer("ok")).with_options(PipelineOptions {
            cap: 5,
            strategy: MatchStrategy::Pushdown,
        });
        for query in ["mari", "perez lopez", "", "nadie"] {
            assert_eq!(
                scan.handle(query).await.unwrap(),
                push.handle(query).await.unwrap(),
                "query {:?}",
                query
            );
        }
    }

    #[test]
    fn test_reports_generator_and_options() {
        let p = pipeline(vec![], Stub::Answer("ok")).with_options(PipelineOptions {
            cap: 3,
            strategy: MatchStrategy::Pushdown,
        });
        assert_eq!(p.generator_name(), "stub");
        assert_eq!(p.options().cap, 3);
        assert_eq!(p.options().strategy, MatchStrategy::Pushdown);
    }
}
