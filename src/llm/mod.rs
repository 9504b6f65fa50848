//! Text generation backends
//!
//! The pipeline talks to a [`Generator`]: prompt in, completion out. The
//! production implementation is [`LlmClient`], which calls a local Ollama
//! server. Every failure is reported as an [`LlmError`]; the pipeline treats
//! all of them as a signal to fall back to a templated answer.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// System turn prepended to every prompt
pub const SYSTEM_PROMPT: &str = "You are a helpful story analysis assistant who provides detailed, accurate answers in English. Always respond in English language only, never in Hindi, Japanese, Chinese, or any other language.";

const TOP_P: f32 = 0.9;
const REPEAT_PENALTY: f32 = 1.1;

/// Generation errors
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport failure or timeout
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Generation request failed: {status} - {body}")]
    Status { status: u16, body: String },

    /// No generator is configured
    #[error("Generator unavailable: {0}")]
    Unavailable(String),

    /// Client could not be constructed
    #[error("Invalid generator configuration: {0}")]
    InvalidConfig(String),
}

impl LlmError {
    /// Transport and server errors may clear up on their own
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. } | Self::Unavailable(_))
    }
}

/// Text completion service
#[async_trait]
pub trait Generator: Send + Sync {
    /// Model or backend name for logs
    fn name(&self) -> &str;

    /// Complete `prompt`; the result is trimmed of surrounding whitespace
    async fn generate(
        &self,
        prompt: &str,
        max_new_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError>;
}

/// Configuration for the generator and per-intent token budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama endpoint URL (default: http://localhost:11434)
    pub endpoint: String,

    /// Model name to use (default: tinyllama)
    pub model: String,

    /// Request timeout in seconds; `None` waits indefinitely
    pub timeout_secs: Option<u64>,

    /// Token budget for analytical answers
    pub analytical_max_tokens: u32,

    /// Token budget for creative retellings
    pub creative_max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "tinyllama".to_string(),
            timeout_secs: None,
            analytical_max_tokens: 300,
            creative_max_tokens: 400,
            temperature: 0.7,
        }
    }
}

impl LlmConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: std::env::var("OLLAMA_ENDPOINT").unwrap_or(defaults.endpoint),
            model: std::env::var("OLLAMA_MODEL").unwrap_or(defaults.model),
            timeout_secs: std::env::var("OLLAMA_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok()),
            analytical_max_tokens: defaults.analytical_max_tokens,
            creative_max_tokens: defaults.creative_max_tokens,
            temperature: std::env::var("OLLAMA_TEMPERATURE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.temperature),
        }
    }
}

/// Wrap a prompt in the system/user/assistant chat frame
pub fn chat_frame(prompt: &str) -> String {
    format!("<|system|>\n{SYSTEM_PROMPT}</s>\n<|user|>\n{prompt}</s>\n<|assistant|>\n")
}

/// Ollama generate request
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    raw: bool,
    options: OllamaOptions,
}

/// Ollama generation options
#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
    top_p: f32,
    repeat_penalty: f32,
}

/// Ollama generate response
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    #[serde(default)]
    #[allow(dead_code)]
    done: bool,
}

/// Ollama-backed generator
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new LLM client with default config
    pub fn new() -> Result<Self, LlmError> {
        Self::with_config(LlmConfig::default())
    }

    /// Create a new LLM client with custom config
    pub fn with_config(config: LlmConfig) -> Result<Self, LlmError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| LlmError::InvalidConfig(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create a client from environment variables
    pub fn from_env() -> Result<Self, LlmError> {
        Self::with_config(LlmConfig::from_env())
    }

    /// Client configuration
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Check if Ollama is available
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.config.endpoint);
        matches!(self.client.get(&url).send().await, Ok(r) if r.status().is_success())
    }
}

#[async_trait]
impl Generator for LlmClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate(
        &self,
        prompt: &str,
        max_new_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.config.endpoint);

        let request = OllamaRequest {
            model: &self.config.model,
            prompt: chat_frame(prompt),
            stream: false,
            raw: true,
            options: OllamaOptions {
                temperature,
                num_predict: max_new_tokens,
                top_p: TOP_P,
                repeat_penalty: REPEAT_PENALTY,
            },
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let ollama_response: OllamaResponse = response.json().await?;
        Ok(ollama_response.response.trim().to_string())
    }
}
