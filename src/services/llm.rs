use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::config::{LlmProvider, LlmSettings};

/// One request/response completion turn against a language model.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[async_trait]
impl<T: ChatCompleter + ?Sized> ChatCompleter for Arc<T> {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        (**self).complete(prompt).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("request timed out")]
    Timeout,
    #[error("rate limited")]
    RateLimited,
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("completer panicked")]
    Panicked,
}

impl LlmError {
    /// Whether repeating the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Request(_) | LlmError::Timeout | LlmError::RateLimited => true,
            LlmError::Status { status, .. } => *status >= 500,
            LlmError::InvalidResponse(_) | LlmError::Panicked => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
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

/// HTTP completion client for Ollama's generate API or any
/// OpenAI-compatible chat completions endpoint, Azure included.
pub struct LLMClient {
    client: reqwest::Client,
    provider: LlmProvider,
    api_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl LLMClient {
    pub fn new(settings: &LlmSettings) -> Self {
        LLMClient {
            client: reqwest::Client::new(),
            provider: settings.provider,
            api_url: settings.api_url.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
        }
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        match self.provider {
            LlmProvider::Ollama => json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
                "format": "json",
                "options": {
                    "temperature": self.temperature
                }
            }),
            LlmProvider::OpenAi | LlmProvider::AzureOpenAi => json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
                "temperature": self.temperature,
                "response_format": { "type": "json_object" }
            }),
        }
    }

    fn extract_text(&self, body: &str) -> Result<String, LlmError> {
        match self.provider {
            LlmProvider::Ollama => serde_json::from_str::<GenerateResponse>(body)
                .map(|r| r.response)
                .map_err(|e| LlmError::InvalidResponse(e.to_string())),
            LlmProvider::OpenAi | LlmProvider::AzureOpenAi => {
                serde_json::from_str::<ChatCompletionResponse>(body)
                    .map_err(|e| LlmError::InvalidResponse(e.to_string()))?
                    .choices
                    .into_iter()
                    .next()
                    .map(|choice| choice.message.content)
                    .ok_or_else(|| LlmError::InvalidResponse("empty choices".to_string()))
            }
        }
    }
}

#[async_trait]
impl ChatCompleter for LLMClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let mut request_builder = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .json(&self.request_body(prompt));

        if let Some(api_key) = &self.api_key {
            request_builder = match self.provider {
                LlmProvider::AzureOpenAi => request_builder.header("api-key", api_key),
                _ => request_builder.header("Authorization", format!("Bearer {}", api_key)),
            };
        }

        tracing::debug!(provider = ?self.provider, model = %self.model, prompt_chars = prompt.len(), "Sending completion request");

        let response = request_builder.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }

        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: response_text,
            });
        }

        self.extract_text(&response_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(provider: LlmProvider) -> LLMClient {
        LLMClient::new(&LlmSettings {
            provider,
            api_url: "http://localhost:11434/api/generate".to_string(),
            api_key: None,
            model: "llama2".to_string(),
            temperature: 0.1,
        })
    }

    #[test]
    fn transient_errors_are_retryable() {
        assert!(LlmError::RateLimited.is_transient());
        assert!(LlmError::Timeout.is_transient());
        assert!(LlmError::Request("connection reset".into()).is_transient());
        assert!(LlmError::Status { status: 503, body: String::new() }.is_transient());
        assert!(!LlmError::Status { status: 401, body: String::new() }.is_transient());
        assert!(!LlmError::InvalidResponse("bad".into()).is_transient());
    }

    #[test]
    fn ollama_body_and_response() {
        let llm = client(LlmProvider::Ollama);
        let body = llm.request_body("hola");
        assert_eq!(body["prompt"], "hola");
        assert_eq!(body["stream"], false);

        let text = llm.extract_text(r#"{"model":"llama2","response":"{\"capitulo\":null}","done":true}"#).unwrap();
        assert_eq!(text, r#"{"capitulo":null}"#);
    }

    #[test]
    fn openai_body_and_response() {
        let llm = client(LlmProvider::OpenAi);
        let body = llm.request_body("hola");
        assert_eq!(body["messages"][0]["content"], "hola");

        let text = llm
            .extract_text(r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}]}"#)
            .unwrap();
        assert_eq!(text, "ok");

        assert!(matches!(llm.extract_text(r#"{"choices":[]}"#), Err(LlmError::InvalidResponse(_))));
    }
}
