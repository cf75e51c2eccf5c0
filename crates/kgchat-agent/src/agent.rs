//! The bounded reasoning loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use kgchat_llm::{LlmProvider, Message};
use tracing::{debug, info, warn};

use crate::error::{AgentError, AgentResult};
use crate::prompt;
use crate::react::{self, ReactStep};
use crate::tool::AgentTool;

/// Budgets and recovery policy for a run.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Maximum model steps per run.
    pub max_iterations: u32,
    /// Wall-clock budget per run.
    pub max_execution: Duration,
    /// Feed unparseable output back to the model instead of failing.
    pub handle_parsing_errors: bool,
    /// Feed tool failures back to the model instead of failing.
    pub handle_tool_errors: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            max_execution: Duration::from_secs(30),
            handle_parsing_errors: true,
            handle_tool_errors: false,
        }
    }
}

/// A reasoning agent bound to a fixed tool set. Immutable once built.
pub struct Agent {
    llm: Arc<dyn LlmProvider>,
    tools: Vec<Arc<dyn AgentTool>>,
    settings: AgentSettings,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("model", &self.llm.model())
            .field("tools", &self.tool_names())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Agent {
    /// Create an agent.
    #[must_use]
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        tools: Vec<Arc<dyn AgentTool>>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            llm,
            tools,
            settings,
        }
    }

    /// Names of the bound tools, in prompt order.
    #[must_use]
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Run settings.
    #[must_use]
    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Answer `input`, invoking tools as the model requests.
    ///
    /// Blocks the calling thread for the whole run.
    ///
    /// # Errors
    ///
    /// Fails when a budget is exhausted, the model call fails, or (depending
    /// on [`AgentSettings`]) when output cannot be parsed or a tool fails.
    pub fn run(&self, input: &str) -> AgentResult<String> {
        let started = Instant::now();
        let mut scratchpad = String::new();

        for iteration in 1..=self.settings.max_iterations {
            let remaining = self.remaining(started)?;
            let prompt = prompt::render(&self.tools, input, &scratchpad);
            let output = self.complete(prompt, remaining)?;
            debug!(iteration, output = %output, "Agent step");

            let observation = match react::parse_step(&output) {
                Ok(ReactStep::Finish { answer }) => {
                    info!(
                        iteration,
                        elapsed_ms = started.elapsed().as_millis(),
                        "Agent finished"
                    );
                    return Ok(answer);
                },
                Ok(ReactStep::Action {
                    tool,
                    input: action_input,
                }) => self.dispatch(&tool, &action_input, started)?,
                Err(e) if self.settings.handle_parsing_errors => {
                    warn!(iteration, error = %e, "Unparseable agent output, retrying");
                    format!("Invalid Format: {e}")
                },
                Err(e) => {
                    return Err(AgentError::OutputParsing {
                        reason: e.to_string(),
                        output,
                    });
                },
            };

            prompt::record_step(&mut scratchpad, &output, &observation);
        }

        warn!(
            max_iterations = self.settings.max_iterations,
            "Agent hit the iteration limit"
        );
        Err(AgentError::IterationLimitExceeded {
            max_iterations: self.settings.max_iterations,
        })
    }

    fn remaining(&self, started: Instant) -> AgentResult<Duration> {
        let remaining = self
            .settings
            .max_execution
            .saturating_sub(started.elapsed());
        if remaining.is_zero() {
            warn!("Agent hit the time limit");
            return Err(self.time_limit());
        }
        Ok(remaining)
    }

    fn time_limit(&self) -> AgentError {
        AgentError::TimeLimitExceeded {
            budget: self.settings.max_execution,
        }
    }

    fn complete(&self, prompt: String, remaining: Duration) -> AgentResult<String> {
        let llm = Arc::clone(&self.llm);

        let response = kgchat_core::block_on(async move {
            let messages = [Message::user(prompt)];
            tokio::time::timeout(remaining, llm.complete(&messages, "")).await
        })?
        .map_err(|_| self.time_limit())??;

        Ok(response.message.content)
    }

    fn dispatch(&self, name: &str, input: &str, started: Instant) -> AgentResult<String> {
        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            warn!(tool = name, "Model requested an unknown tool");
            return Ok(format!(
                "{name} is not a valid tool, try one of [{}].",
                prompt::tool_names(&self.tools)
            ));
        };

        let remaining = self.remaining(started)?;
        info!(tool = name, "Invoking tool");
        match tool.invoke(input, remaining) {
            Ok(observation) => Ok(observation),
            // A call cut short by the run's own deadline is a budget failure.
            Err(e) if self.settings.max_execution <= started.elapsed() => {
                warn!(tool = name, error = %e, "Tool call ran out of time");
                Err(self.time_limit())
            },
            Err(e) if self.settings.handle_tool_errors => {
                warn!(tool = name, error = %e, "Tool failed, reporting to model");
                Ok(format!("Error: {e}"))
            },
            Err(source) => Err(AgentError::Tool {
                tool: name.to_string(),
                source,
            }),
        }
    }
}
