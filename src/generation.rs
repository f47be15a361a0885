//! Text-generation clients.
//!
//! Implements the core [`Generator`] trait against hosted language models:
//! - **[`OpenAiGenerator`]**: `POST {url}/chat/completions`.
//! - **[`GeminiGenerator`]**: `POST {url}/models/{model}:generateContent`.
//! - **[`DisabledGenerator`]**: always fails; used when no provider is configured.
//!
//! Use [`create_generator`] to build the one configured in `[generation]`.
//!
//! # Failure mapping
//!
//! Every client makes exactly one HTTP round trip per call and never retries.
//!
//! | Condition | Error |
//! |-----------|-------|
//! | Request exceeds `timeout_secs` | [`GenerationError::Timeout`] |
//! | Connection failure, non-2xx status | [`GenerationError::Unavailable`] |
//! | Undecodable body, no answer text | [`GenerationError::Malformed`] |

use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use personas_core::{GenerationError, GenerationOptions, Generator};

use crate::config::GenerationConfig;

/// Builds the generator selected by `config.provider`.
///
/// # Errors
///
/// Fails if the provider is unknown, or if the API key environment variable
/// is not set for a network provider.
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    let timeout = Duration::from_secs(config.timeout_secs);
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledGenerator)),
        "openai" | "gemini" => {
            let key_env = config.api_key_env_or_default();
            let api_key = std::env::var(&key_env)
                .map_err(|_| anyhow::anyhow!("{} environment variable not set", key_env))?;
            let url = config.url_or_default();
            let model = config.model_or_default();
            if config.provider == "openai" {
                Ok(Arc::new(OpenAiGenerator::new(url, model, api_key, timeout)?))
            } else {
                Ok(Arc::new(GeminiGenerator::new(url, model, api_key, timeout)?))
            }
        }
        other => bail!("Unknown generation provider: {}", other),
    }
}

fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

fn transport_error(err: reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout(err.to_string())
    } else {
        GenerationError::Unavailable(err.to_string())
    }
}

/// Sends a prepared request and returns the body of a 2xx response.
async fn send(request: reqwest::RequestBuilder) -> Result<String, GenerationError> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;
    if !status.is_success() {
        return Err(GenerationError::Unavailable(format!(
            "status {}: {}",
            status, body
        )));
    }
    Ok(body)
}

// ============ Disabled ============

/// Generator used when `generation.provider = "disabled"`.
pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn generate(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::Disabled)
    }
}

// ============ OpenAI ============

/// OpenAI-compatible chat completions client.
///
/// Works with any server exposing `/chat/completions` (OpenAI, Azure
/// deployments behind a proxy, local gateways).
pub struct OpenAiGenerator {
    client: Client,
    url: String,
    model: String,
    api_key: String,
}

impl OpenAiGenerator {
    pub fn new(url: String, model: String, api_key: String, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            bail!("OpenAI API key cannot be empty");
        }
        Ok(Self {
            client: build_client(timeout)?,
            url,
            model,
            api_key,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

fn parse_chat_response(body: &str) -> Result<String, GenerationError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Malformed(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| GenerationError::Malformed("response has no choices".to_string()))
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature,
        };

        let request = self
            .client
            .post(format!("{}/chat/completions", self.url))
            .bearer_auth(&self.api_key)
            .json(&body);

        let text = send(request).await?;
        parse_chat_response(&text)
    }
}

// ============ Gemini ============

/// Google Gemini `generateContent` client.
pub struct GeminiGenerator {
    client: Client,
    url: String,
    model: String,
    api_key: String,
}

impl GeminiGenerator {
    pub fn new(url: String, model: String, api_key: String, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            bail!("Gemini API key cannot be empty");
        }
        Ok(Self {
            client: build_client(timeout)?,
            url,
            model,
            api_key,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

fn parse_gemini_response(body: &str) -> Result<String, GenerationError> {
    let parsed: GeminiResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Malformed(e.to_string()))?;
    let parts = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .ok_or_else(|| GenerationError::Malformed("response has no candidates".to_string()))?;

    let texts: Vec<String> = parts.into_iter().filter_map(|p| p.text).collect();
    if texts.is_empty() {
        return Err(GenerationError::Malformed(
            "candidate has no text parts".to_string(),
        ));
    }
    Ok(texts.concat())
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationError> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: options.temperature,
            },
        };

        let request = self
            .client
            .post(format!("{}/models/{}:generateContent", self.url, self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body);

        let text = send(request).await?;
        parse_gemini_response(&text)
    }
}
