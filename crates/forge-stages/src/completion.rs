//! Completion client: thin wrapper over an OpenRouter-style chat
//! completions endpoint. One request, one response, no retries; retrying is
//! the caller's decision.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// One completion invocation: a system instruction, a user payload, and
/// generation parameters.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_content: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("invalid completion request: {0}")]
    InvalidRequest(&'static str),
    #[error("completion transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion response carried no message content")]
    MalformedResponse,
}

/// Backend capable of turning a prompt pair into generated text. The stages
/// hold this behind an `Arc` so tests can substitute a scripted fake.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

/// Live client for an OpenRouter-compatible chat completions API.
pub struct HttpCompletionClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpCompletionClient {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        if request.system_prompt.trim().is_empty() {
            return Err(CompletionError::InvalidRequest("system prompt is empty"));
        }
        if request.user_content.trim().is_empty() {
            return Err(CompletionError::InvalidRequest("user content is empty"));
        }
        if request.max_tokens == 0 {
            return Err(CompletionError::InvalidRequest("max_tokens must be positive"));
        }

        let payload = serde_json::json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_content },
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(CompletionError::MalformedResponse)
    }
}
