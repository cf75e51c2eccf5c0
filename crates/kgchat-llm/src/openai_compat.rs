//! OpenAI-compatible chat completions client.
//!
//! Works with any endpoint that speaks `/v1/chat/completions`, in particular
//! the one a local model runtime exposes once a model is loaded.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{LlmError, LlmResult};
use crate::provider::LlmProvider;
use crate::types::{LlmResponse, Message, MessageRole, StopReason, Usage};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    client: Client,
    model: String,
    max_tokens: usize,
    temperature: f64,
    stop: Vec<String>,
    url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OpenAiCompatProvider {
    /// Create a provider posting to the full completions `url`.
    #[must_use]
    pub fn custom(url: &str, api_key: Option<&str>, model: &str) -> Self {
        Self {
            client: Client::new(),
            model: model.to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            stop: Vec::new(),
            url: url.to_string(),
            api_key: api_key.map(ToString::to_string),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a provider from an API root such as `http://127.0.0.1:5273/v1`.
    #[must_use]
    pub fn from_endpoint(endpoint: &str, api_key: Option<&str>, model: &str) -> Self {
        let url = format!("{}/chat/completions", endpoint.trim_end_matches('/'));
        Self::custom(&url, api_key, model)
    }

    /// Set max tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Add a stop sequence.
    #[must_use]
    pub fn with_stop(mut self, sequence: impl Into<String>) -> Self {
        self.stop.push(sequence.into());
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Completions URL requests are posted to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Configured stop sequences.
    #[must_use]
    pub fn stop_sequences(&self) -> &[String] {
        &self.stop
    }

    fn build_request(&self, messages: &[Message], system: &str) -> Value {
        let mut openai_messages = Vec::with_capacity(messages.len().saturating_add(1));

        if !system.is_empty() {
            openai_messages.push(serde_json::json!({
                "role": "system",
                "content": system
            }));
        }

        for msg in messages {
            openai_messages.push(convert_message(msg));
        }

        let mut request = serde_json::json!({
            "model": self.model,
            "messages": openai_messages,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "stream": false
        });

        if !self.stop.is_empty() {
            request["stop"] = serde_json::json!(self.stop);
        }

        request
    }
}

fn convert_message(msg: &Message) -> Value {
    let role = match msg.role {
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
        MessageRole::System => "system",
    };
    serde_json::json!({
        "role": role,
        "content": msg.content
    })
}

fn into_llm_response(response: OpenAiResponse) -> LlmResult<LlmResponse> {
    let usage = response.usage.map_or_else(Usage::default, |u| Usage {
        input_tokens: u.prompt_tokens,
        output_tokens: u.completion_tokens,
    });

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

    let stop_reason = match choice.finish_reason.as_deref() {
        Some("length") => StopReason::MaxTokens,
        Some("content_filter") => StopReason::ContentFilter,
        _ => StopReason::EndTurn,
    };

    Ok(LlmResponse {
        message: Message::assistant(choice.message.content.unwrap_or_default()),
        stop_reason,
        usage,
    })
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "openai-compat"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[Message], system: &str) -> LlmResult<LlmResponse> {
        if self.api_key.as_ref().is_none_or(String::is_empty) && !is_local_url(&self.url) {
            return Err(LlmError::ApiKeyNotConfigured {
                provider: "openai-compat".to_string(),
            });
        }

        let request_body = self.build_request(messages, system);

        debug!(
            model = %self.model,
            url = %self.url,
            messages = messages.len(),
            "Making OpenAI-compatible completion request"
        );

        let mut request = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .header("Content-Type", "application/json");

        if let Some(ref api_key) = self.api_key {
            let mut auth_value = reqwest::header::HeaderValue::try_from(format!(
                "Bearer {api_key}"
            ))
            .map_err(|e| LlmError::ApiRequestFailed(format!("Invalid API key characters: {e}")))?;
            auth_value.set_sensitive(true);
            request = request.header("Authorization", auth_value);
        }

        let response = request
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status_code = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::InvalidResponse(format!(
                "HTTP {status_code}: {body}"
            )));
        }

        let response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        into_llm_response(response)
    }
}

impl std::fmt::Debug for OpenAiCompatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatProvider")
            .field("model", &self.model)
            .field("url", &self.url)
            .field("has_api_key", &self.api_key.is_some())
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("stop", &self.stop)
            .finish_non_exhaustive()
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

/// Whether a URL points at this machine, where no API key is required.
fn is_local_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.contains("localhost") || lower.contains("127.0.0.1") || lower.contains("[::1]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_endpoint_joins_path() {
        let provider = OpenAiCompatProvider::from_endpoint("http://127.0.0.1:5273/v1/", None, "m");
        assert_eq!(provider.url(), "http://127.0.0.1:5273/v1/chat/completions");
    }

    #[test]
    fn test_build_request_with_stop() {
        let provider = OpenAiCompatProvider::custom("http://localhost/v1/chat/completions", None, "m")
            .with_temperature(0.0)
            .with_stop("\nObservation:");
        let request = provider.build_request(&[Message::user("Hi")], "Be helpful");

        assert_eq!(request["model"], "m");
        assert_eq!(request["stream"], false);
        assert_eq!(request["temperature"], 0.0);
        assert_eq!(request["stop"][0], "\nObservation:");
        let messages = request["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "Hi");
    }

    #[test]
    fn test_build_request_without_stop_or_system() {
        let provider = OpenAiCompatProvider::custom("http://localhost/v1/chat/completions", None, "m");
        let request = provider.build_request(&[Message::user("Hi")], "");

        assert!(request.get("stop").is_none());
        assert_eq!(request["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_response_conversion() {
        let raw: OpenAiResponse = serde_json::from_value(serde_json::json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Final Answer: 4"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 4}
        }))
        .unwrap();

        let response = into_llm_response(raw).unwrap();
        assert_eq!(response.message.content, "Final Answer: 4");
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.total(), 14);
    }

    #[test]
    fn test_response_without_usage_or_choices() {
        let raw: OpenAiResponse =
            serde_json::from_value(serde_json::json!({"choices": []})).unwrap();
        assert!(matches!(
            into_llm_response(raw),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_remote_without_key_is_rejected() {
        let provider = OpenAiCompatProvider::custom("https://models.example.com/v1/chat/completions", None, "m");
        let err = provider.complete(&[], "").await.unwrap_err();
        assert!(matches!(err, LlmError::ApiKeyNotConfigured { .. }));
    }

    #[tokio::test]
    async fn test_invalid_api_key_characters() {
        let provider = OpenAiCompatProvider::custom(
            "http://localhost:1/v1/chat/completions",
            Some("invalid\nkey"),
            "m",
        );
        let err = provider.complete(&[], "").await.unwrap_err();
        assert!(
            matches!(err, LlmError::ApiRequestFailed(ref msg) if msg.contains("Invalid API key characters"))
        );
    }

    #[test]
    fn test_is_local_url() {
        assert!(is_local_url("http://LOCALHOST:5273/v1"));
        assert!(is_local_url("http://127.0.0.1:5273/v1"));
        assert!(!is_local_url("https://api.openai.com/v1"));
    }
}
