//! Client for the upstream chat-completion service used by the content tools.

use crate::error::{ToolError, ToolResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// A single-prompt completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            max_tokens,
        }
    }
}

/// Opaque text-generation service
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion, returned with surrounding whitespace trimmed
    async fn generate(&self, request: GenerationRequest) -> ToolResult<String>;
}

/// Connection settings for the chat-completion API.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// API key. Without one every generation fails before any request is made.
    pub api_key: Option<String>,
    pub model: String,
    /// Base URL, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            retry: RetryConfig::default(),
        }
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries.
    pub max_retries: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Calculate backoff duration for a given attempt.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let backoff = Duration::from_millis(backoff_ms as u64);
        std::cmp::min(backoff, self.max_backoff)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// [`TextGenerator`] backed by an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiGenerator {
    client: reqwest::Client,
    config: GeneratorConfig,
}

impl OpenAiGenerator {
    pub fn new(config: GeneratorConfig) -> anyhow::Result<Self> {
        // Reject unusable base URLs at startup rather than on the first call
        url::Url::parse(&config.base_url)
            .map_err(|e| anyhow::anyhow!("Invalid text generation base URL '{}': {}", config.base_url, e))?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("study-assistant/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn send_once(&self, api_key: &str, body: &ChatCompletionRequest<'_>) -> ToolResult<String> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ToolError::UpstreamTimeout(e.to_string())
                } else {
                    ToolError::Upstream {
                        status: e.status().map(|s| s.as_u16()).unwrap_or(502),
                        details: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(ToolError::Upstream {
                status: status.as_u16(),
                details,
            });
        }

        let completion: ChatCompletionResponse =
            response.json().await.map_err(|e| ToolError::Upstream {
                status: status.as_u16(),
                details: format!("Invalid completion payload: {}", e),
            })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ToolError::Upstream {
                status: status.as_u16(),
                details: "Completion contained no content".to_string(),
            })
    }
}

#[async_trait::async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, request: GenerationRequest) -> ToolResult<String> {
        let api_key = self
            .api_key()
            .ok_or_else(|| ToolError::Configuration("OpenAI API key not configured.".to_string()))?;

        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let retry = &self.config.retry;
        let mut attempts = 0;
        loop {
            debug!(model = %self.config.model, attempt = attempts + 1, "Requesting completion");

            match self.send_once(api_key, &body).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_retryable() && attempts < retry.max_retries => {
                    let backoff = retry.backoff_for_attempt(attempts);
                    warn!(
                        error = %e,
                        attempt = attempts + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        "Completion failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempts += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
