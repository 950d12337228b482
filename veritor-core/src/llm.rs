//! Narrow LLM capability for claim decomposition.
//!
//! The verification pipeline needs exactly one thing from a language model:
//! prompt in, text out. Keeping the trait this small isolates the optional
//! external dependency behind a contract the rest of the pipeline never
//! sees past.

use crate::config::LlmConfig;
use crate::error::LlmError;
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Minimal prompt-to-text completion capability.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a single user prompt and return the response text.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model name for logs.
    fn model_name(&self) -> &str;
}

/// Provider for any endpoint following the OpenAI chat-completions format
/// (OpenAI, Azure OpenAI, Ollama, vLLM, LM Studio).
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    timeout_secs: u64,
}

impl OpenAiCompatProvider {
    /// Build from configuration. Returns an auth error when the configured
    /// key environment variable is empty — decomposition falls back to the
    /// deterministic strategy in that case, but configuring a provider
    /// without a key is reported at construction.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
        if api_key.is_empty() {
            return Err(LlmError::AuthFailed {
                provider: config.model.clone(),
            });
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::ApiRequest { message: e.to_string() })?;
        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com".into()),
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.temperature,
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        timeout_secs: self.timeout_secs,
                    }
                } else {
                    LlmError::ApiRequest { message: e.to_string() }
                }
            })?;

        if !resp.status().is_success() {
            return Err(LlmError::ApiRequest {
                message: format!("status {}", resp.status()),
            });
        }

        let parsed: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| LlmError::ResponseParse { message: e.to_string() })?;

        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| LlmError::ResponseParse {
                message: "missing choices[0].message.content".into(),
            })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Mock provider with queued responses, for tests.
#[derive(Default)]
pub struct MockLlmProvider {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_response(&self, response: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(response.into()));
    }

    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("[]".into()))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
