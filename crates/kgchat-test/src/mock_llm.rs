//! Mock LLM provider for testing.
//!
//! [`MockLlmProvider`] replays pre-configured turns in order, so reasoning
//! loops can be driven step by step without a model runtime.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use kgchat_llm::{LlmError, LlmProvider, LlmResponse, LlmResult, Message, StopReason, Usage};

/// A single scripted turn.
#[derive(Debug, Clone)]
pub enum MockLlmTurn {
    /// The assistant replies with this text.
    Text(String),
    /// The call fails with this message.
    Error(String),
}

impl MockLlmTurn {
    /// Create a text turn.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create an error turn.
    #[must_use]
    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error(msg.into())
    }

    /// A ReAct step that invokes `tool` with `input`.
    #[must_use]
    pub fn action(tool: &str, input: &str) -> Self {
        Self::Text(format!(
            " I should use a tool.\nAction: {tool}\nAction Input: {input}"
        ))
    }

    /// A ReAct step that finishes with `answer`.
    #[must_use]
    pub fn final_answer(answer: &str) -> Self {
        Self::Text(format!(
            " I now know the final answer\nFinal Answer: {answer}"
        ))
    }
}

/// A deterministic, queue-based [`LlmProvider`] for tests.
///
/// Turns are popped from the front of the queue on each call. Once the queue
/// is empty the repeat turn is replayed if one is set, otherwise the call
/// fails. The messages of every call are captured.
pub struct MockLlmProvider {
    turns: Mutex<VecDeque<MockLlmTurn>>,
    repeat: Option<MockLlmTurn>,
    delay: Option<Duration>,
    call_count: Mutex<usize>,
    captured_messages: Mutex<Vec<Vec<Message>>>,
}

impl MockLlmProvider {
    /// Create a provider preloaded with `turns`.
    #[must_use]
    pub fn new(turns: Vec<MockLlmTurn>) -> Self {
        Self {
            turns: Mutex::new(VecDeque::from(turns)),
            repeat: None,
            delay: None,
            call_count: Mutex::new(0),
            captured_messages: Mutex::new(Vec::new()),
        }
    }

    /// A provider that answers every call with `turn`.
    #[must_use]
    pub fn repeating(turn: MockLlmTurn) -> Self {
        Self::new(Vec::new()).with_repeat(turn)
    }

    /// Replay `turn` once the queue is exhausted.
    #[must_use]
    pub fn with_repeat(mut self, turn: MockLlmTurn) -> Self {
        self.repeat = Some(turn);
        self
    }

    /// Sleep for `delay` before answering each call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of completed or failed calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().expect("lock poisoned")
    }

    /// Messages passed to each call, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn captured_messages(&self) -> Vec<Vec<Message>> {
        self.captured_messages
            .lock()
            .expect("lock poisoned")
            .clone()
    }

    /// Content of the last user message of the most recent call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn last_prompt(&self) -> Option<String> {
        self.captured_messages
            .lock()
            .expect("lock poisoned")
            .last()
            .and_then(|messages| messages.last())
            .map(|m| m.content.clone())
    }

    fn next_turn(&self, messages: &[Message]) -> LlmResult<MockLlmTurn> {
        {
            let mut count = self.call_count.lock().expect("lock poisoned");
            *count = count.saturating_add(1);
        }
        self.captured_messages
            .lock()
            .expect("lock poisoned")
            .push(messages.to_vec());

        let mut turns = self.turns.lock().expect("lock poisoned");
        turns
            .pop_front()
            .or_else(|| self.repeat.clone())
            .ok_or_else(|| {
                LlmError::ApiRequestFailed("MockLlmProvider: no more turns queued".to_string())
            })
    }
}

#[async_trait]
#[allow(clippy::unnecessary_literal_bound)]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, messages: &[Message], _system: &str) -> LlmResult<LlmResponse> {
        let turn = self.next_turn(messages)?;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match turn {
            MockLlmTurn::Text(text) => Ok(LlmResponse {
                message: Message::assistant(text),
                stop_reason: StopReason::EndTurn,
                usage: Usage {
                    input_tokens: 100,
                    output_tokens: 50,
                },
            }),
            MockLlmTurn::Error(msg) => Err(LlmError::ApiRequestFailed(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_queue_then_fails() {
        let provider = MockLlmProvider::new(vec![MockLlmTurn::text("one")]);

        assert_eq!(provider.complete_simple("a").await.unwrap(), "one");
        assert!(provider.complete_simple("b").await.is_err());
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.last_prompt().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_repeat_turn_never_runs_out() {
        let provider = MockLlmProvider::repeating(MockLlmTurn::text("again"));
        for _ in 0..5 {
            assert_eq!(provider.complete_simple("x").await.unwrap(), "again");
        }
        assert_eq!(provider.captured_messages().len(), 5);
    }
}
