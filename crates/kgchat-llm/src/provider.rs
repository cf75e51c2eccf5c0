//! LLM provider trait.

use async_trait::async_trait;

use crate::error::LlmResult;
use crate::types::{LlmResponse, Message};

/// A chat-completion capable model.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Get the model being used.
    fn model(&self) -> &str;

    /// Complete the conversation. `system` is prepended when non-empty.
    async fn complete(&self, messages: &[Message], system: &str) -> LlmResult<LlmResponse>;

    /// Single-turn completion without a system prompt.
    async fn complete_simple(&self, prompt: &str) -> LlmResult<String> {
        let messages = vec![Message::user(prompt)];
        let response = self.complete(&messages, "").await?;
        Ok(response.message.content)
    }
}
