//! Answer composition.
//!
//! Turns a query and its matched records into a prompt, sends it to the
//! [`Generator`], and returns the generated text unmodified.

use std::sync::Arc;

use crate::error::{GenerationError, QueryError};
use crate::generation::{GenerationOptions, Generator};
use crate::matcher::query_terms;
use crate::record::Record;
use crate::store::RecordStore;

const QUERY_SLOT: &str = "{query}";
const DATA_SLOT: &str = "{relevant_data}";

/// Default prompt, in the language of the stored personas.
pub const DEFAULT_TEMPLATE: &str = "Basado en la siguiente consulta y los datos relevantes, \
proporciona una respuesta clara y concisa:

Consulta: {query}

Datos relevantes:
{relevant_data}

Respuesta:";

/// A prompt template with `{query}` and `{relevant_data}` slots.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate(String);

impl PromptTemplate {
    /// Validates and wraps a template. `{query}` is required;
    /// `{relevant_data}` is optional.
    pub fn new(template: impl Into<String>) -> Result<Self, String> {
        let template = template.into();
        if !template.contains(QUERY_SLOT) {
            return Err(format!("prompt template must contain {}", QUERY_SLOT));
        }
        Ok(Self(template))
    }

    pub fn render(&self, query: &str, relevant_data: &str) -> String {
        // Data first, so a query containing "{relevant_data}" is not expanded.
        self.0
            .replace(DATA_SLOT, relevant_data)
            .replace(QUERY_SLOT, query)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self(DEFAULT_TEMPLATE.to_string())
    }
}

/// Builds prompts and calls the generator.
#[derive(Clone)]
pub struct AnswerComposer {
    generator: Arc<dyn Generator>,
    options: GenerationOptions,
    template: PromptTemplate,
}

impl AnswerComposer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            options: GenerationOptions::default(),
            template: PromptTemplate::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Renders the prompt: the verbatim query plus one line per record.
    pub fn build_prompt(&self, query: &str, matches: &[Record]) -> String {
        let data = matches
            .iter()
            .map(Record::render)
            .collect::<Vec<_>>()
            .join("\n");
        self.template.render(query, &data)
    }

    /// One generator call; no retry, no partial answer.
    pub async fn compose(&self, query: &str, matches: &[Record]) -> Result<String, GenerationError> {
        let prompt = self.build_prompt(query, matches);
        self.generator.generate(&prompt, &self.options).await
    }

    /// Structured variant: the term filter is pushed into the store via
    /// [`RecordStore::find_matching`] instead of scanning every record here.
    ///
    /// Returns the answer together with the records it was built from.
    pub async fn compose_structured(
        &self,
        query: &str,
        store: &dyn RecordStore,
        cap: usize,
    ) -> Result<(String, Vec<Record>), QueryError> {
        let matches = store.find_matching(&query_terms(query), cap).await?;
        let answer = self.compose(query, &matches).await?;
        Ok((answer, matches))
    }
}
