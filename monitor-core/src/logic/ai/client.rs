//! Text Generation Client
//!
//! HTTP client for an OpenAI-compatible chat completions endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// CONFIG
// ============================================================================

/// Provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSettings {
    /// Empty key disables generation
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: 30,
            temperature: 0.7,
        }
    }
}

impl AiSettings {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiError {
    #[error("text generation is not configured")]
    NotConfigured,

    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned status {0}")]
    Server(u16),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("provider returned no text")]
    EmptyResponse,

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

// ============================================================================
// GENERATOR TRAIT
// ============================================================================

/// Single-shot prompt/response text generation
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String, AiError>;
}

// ============================================================================
// OPENAI CLIENT
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

pub struct OpenAiClient {
    settings: AiSettings,
    http_client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(settings: AiSettings) -> Result<Self, AiError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AiError::Network(e.to_string()))?;

        Ok(Self {
            settings,
            http_client,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String, AiError> {
        if !self.settings.is_configured() {
            return Err(AiError::NotConfigured);
        }

        let request = ChatRequest {
            model: &self.settings.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature: self.settings.temperature,
        };

        log::debug!("Sending prompt to {} ({})", self.settings.base_url, self.settings.model);

        let response = self.http_client
            .post(self.completions_url())
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AiError::Server(response.status().as_u16()));
        }

        let body: ChatResponse = response.json().await
            .map_err(|e| AiError::Parse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}
