//! Text-generation collaborator trait.
//!
//! Concrete HTTP clients (OpenAI, Gemini) live in the application crate.
//! The core only needs a prompt-in, text-out call with a temperature.

use async_trait::async_trait;

use crate::error::GenerationError;

/// Per-call generation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// Sampling temperature. `0.0` asks for deterministic output.
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self { temperature: 0.0 }
    }
}

/// An external language model that turns a prompt into text.
///
/// Implementations perform a single round trip per call and must not retry;
/// timeouts are enforced by the implementation and reported as
/// [`GenerationError::Timeout`].
#[async_trait]
pub trait Generator: Send + Sync {
    /// Provider identifier for logs (e.g. `"openai"`).
    fn name(&self) -> &str;

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationError>;
}
