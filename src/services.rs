//! Long-lived collaborator handles.
//!
//! Built once at startup from [`Config`] and shared by every request: the
//! record store, the generator, and the query pipeline assembled from them.

use anyhow::{Context, Result};
use std::sync::Arc;

use personas_core::{
    AnswerComposer, GenerationOptions, Generator, InMemoryStore, PipelineOptions, QueryPipeline,
    RecordStore,
};

use crate::config::{Config, StoreBackend};
use crate::generation::create_generator;
use crate::import::load_records_file;
use crate::sqlite_store::SqliteStore;

#[derive(Clone)]
pub struct Services {
    store: Arc<dyn RecordStore>,
    pipeline: Arc<QueryPipeline>,
}

impl Services {
    /// Opens the configured store and generator.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = open_store(config).await?;
        let generator = create_generator(&config.generation)?;
        Self::new(store, generator, config)
    }

    /// Assembles the pipeline from explicit collaborators.
    pub fn new(
        store: Arc<dyn RecordStore>,
        generator: Arc<dyn Generator>,
        config: &Config,
    ) -> Result<Self> {
        let composer = AnswerComposer::new(generator)
            .with_options(GenerationOptions {
                temperature: config.generation.temperature,
            })
            .with_template(config.generation.template()?);

        let pipeline = QueryPipeline::new(store.clone(), composer).with_options(PipelineOptions {
            cap: config.matching.cap,
            strategy: config.matching.strategy,
        });

        Ok(Self {
            store,
            pipeline: Arc::new(pipeline),
        })
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn pipeline(&self) -> &QueryPipeline {
        &self.pipeline
    }
}

/// Opens the configured record store without touching the generator.
pub async fn open_store(config: &Config) -> Result<Arc<dyn RecordStore>> {
    match config.store.backend {
        StoreBackend::Sqlite => {
            let store = SqliteStore::open(&config.store).await.with_context(|| {
                format!("Failed to open database: {}", config.store.path.display())
            })?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            let store = InMemoryStore::new();
            if let Some(seed) = &config.store.seed {
                for (id, record) in load_records_file(seed, &config.store.id_field)? {
                    store.insert(id, record);
                }
                tracing::info!(records = store.len(), seed = %seed.display(), "seeded memory store");
            }
            Ok(Arc::new(store))
        }
    }
}
