//! Zero-shot ReAct prompt.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::tool::AgentTool;

/// Render the prompt for the next step.
///
/// `scratchpad` holds every previous step with its observation and ends with
/// `Thought:` once at least one step has run.
pub(crate) fn render(tools: &[Arc<dyn AgentTool>], question: &str, scratchpad: &str) -> String {
    let mut descriptions = String::new();
    for tool in tools {
        let _ = writeln!(descriptions, "{}: {}", tool.name(), tool.description());
    }

    format!(
        "Answer the following questions as best you can. You have access to the following tools:\n\
         \n\
         {descriptions}\
         \n\
         Use the following format:\n\
         \n\
         Question: the input question you must answer\n\
         Thought: you should always think about what to do\n\
         Action: the action to take, should be one of [{names}]\n\
         Action Input: the input to the action\n\
         Observation: the result of the action\n\
         ... (this Thought/Action/Action Input/Observation can repeat N times)\n\
         Thought: I now know the final answer\n\
         Final Answer: the final answer to the original input question\n\
         \n\
         Begin!\n\
         \n\
         Question: {question}\n\
         Thought:{scratchpad}",
        names = tool_names(tools),
    )
}

/// Comma-separated tool names.
pub(crate) fn tool_names(tools: &[Arc<dyn AgentTool>]) -> String {
    tools
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Append a completed step to the scratchpad.
pub(crate) fn record_step(scratchpad: &mut String, output: &str, observation: &str) {
    let _ = write!(
        scratchpad,
        "{}\nObservation: {observation}\nThought:",
        output.trim_end()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use std::time::Duration;

    struct Named(&'static str);

    impl AgentTool for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "does things"
        }

        fn invoke(&self, _input: &str, _budget: Duration) -> Result<String, ToolError> {
            Ok(String::new())
        }
    }

    #[test]
    fn test_render_lists_tools_and_question() {
        let tools: Vec<Arc<dyn AgentTool>> = vec![Arc::new(Named("read_graph")), Arc::new(Named("other"))];
        let prompt = render(&tools, "Who is Alice?", "");

        assert!(prompt.contains("read_graph: does things\nother: does things\n"));
        assert!(prompt.contains("should be one of [read_graph, other]"));
        assert!(prompt.ends_with("Question: Who is Alice?\nThought:"));
    }

    #[test]
    fn test_record_step_appends_observation() {
        let mut scratchpad = String::new();
        record_step(&mut scratchpad, " look\nAction: read_graph\nAction Input: {}\n", "graph");

        assert_eq!(
            scratchpad,
            " look\nAction: read_graph\nAction Input: {}\nObservation: graph\nThought:"
        );
    }
}
