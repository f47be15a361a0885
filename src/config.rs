//! TOML configuration parsing and validation.
//!
//! The service is configured from a single TOML file (default
//! `config/personas.toml`). Credentials are never stored in the file: the
//! generation section names the environment variable that holds the API key.
//!
//! ```toml
//! [store]
//! backend = "sqlite"
//! path = "./data/personas.sqlite"
//!
//! [matching]
//! cap = 5
//! strategy = "scan"
//!
//! [generation]
//! provider = "openai"
//! model = "gpt-4o-mini"
//! timeout_secs = 30
//!
//! [server]
//! bind = "127.0.0.1:8001"
//!
//! [log_service]
//! url = "http://localhost:8002"
//! ```

use anyhow::{Context, Result};
use personas_core::{MatchStrategy, PromptTemplate, DEFAULT_MATCH_CAP};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub log_service: LogServiceConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// JSON array of records loaded into the memory backend at startup.
    #[serde(default)]
    pub seed: Option<PathBuf>,
    /// Field whose value becomes the record id on import.
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            path: default_db_path(),
            seed: None,
            id_field: default_id_field(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/personas.sqlite")
}
fn default_id_field() -> String {
    "numero_documento".to_string()
}
fn default_max_connections() -> u32 {
    5
}
fn default_acquire_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    #[serde(default = "default_cap")]
    pub cap: usize,
    #[serde(default)]
    pub strategy: MatchStrategy,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            cap: default_cap(),
            strategy: MatchStrategy::Scan,
        }
    }
}

fn default_cap() -> usize {
    DEFAULT_MATCH_CAP
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// API base URL; defaults per provider.
    #[serde(default)]
    pub url: Option<String>,
    /// Environment variable holding the API key; defaults per provider.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub prompt_template: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            url: None,
            api_key_env: None,
            temperature: 0.0,
            timeout_secs: default_timeout_secs(),
            prompt_template: None,
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl GenerationConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    pub fn model_or_default(&self) -> String {
        self.model.clone().unwrap_or_else(|| {
            match self.provider.as_str() {
                "gemini" => "gemini-2.0-flash",
                _ => "gpt-4o-mini",
            }
            .to_string()
        })
    }

    pub fn url_or_default(&self) -> String {
        let url = self.url.clone().unwrap_or_else(|| {
            match self.provider.as_str() {
                "gemini" => "https://generativelanguage.googleapis.com/v1beta",
                _ => "https://api.openai.com/v1",
            }
            .to_string()
        });
        url.trim_end_matches('/').to_string()
    }

    pub fn api_key_env_or_default(&self) -> String {
        self.api_key_env.clone().unwrap_or_else(|| {
            match self.provider.as_str() {
                "gemini" => "GEMINI_API_KEY",
                _ => "OPENAI_API_KEY",
            }
            .to_string()
        })
    }

    /// The configured template, or the built-in default.
    pub fn template(&self) -> Result<PromptTemplate> {
        match &self.prompt_template {
            Some(t) => PromptTemplate::new(t.clone())
                .map_err(|e| anyhow::anyhow!("generation.prompt_template: {}", e)),
            None => Ok(PromptTemplate::default()),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8001".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogServiceConfig {
    /// Base URL of the logging service. Without it, events are only traced.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_log_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LogServiceConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_log_timeout_secs(),
        }
    }
}

fn default_log_timeout_secs() -> u64 {
    5
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.matching.cap < 1 {
        anyhow::bail!("matching.cap must be >= 1");
    }

    if config.store.max_connections == 0 {
        anyhow::bail!("store.max_connections must be > 0");
    }

    if config.store.id_field.trim().is_empty() {
        anyhow::bail!("store.id_field must not be empty");
    }

    match config.generation.provider.as_str() {
        "openai" | "gemini" | "disabled" => {}
        other => anyhow::bail!(
            "Unknown generation provider: '{}'. Must be openai, gemini, or disabled.",
            other
        ),
    }

    if config.generation.timeout_secs == 0 {
        anyhow::bail!("generation.timeout_secs must be > 0");
    }

    if !(0.0..=2.0).contains(&config.generation.temperature) {
        anyhow::bail!("generation.temperature must be in [0.0, 2.0]");
    }

    config.generation.template()?;

    if config.log_service.timeout_secs == 0 {
        anyhow::bail!("log_service.timeout_secs must be > 0");
    }

    Ok(())
}
