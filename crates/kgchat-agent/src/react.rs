//! Parsing of ReAct-formatted model output.

use std::fmt;

const FINAL_ANSWER: &str = "Final Answer:";
const ACTION: &str = "Action:";
const ACTION_INPUT: &str = "Action Input:";

/// One decoded model step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactStep {
    /// Invoke `tool` with `input`.
    Action {
        /// Tool name.
        tool: String,
        /// Raw action input.
        input: String,
    },
    /// Stop with `answer`.
    Finish {
        /// Final answer text.
        answer: String,
    },
}

/// Why a model step could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Neither an action nor a final answer was present.
    MissingAction,
    /// An action was named without an input.
    MissingActionInput,
    /// Both an action and a final answer were present.
    Ambiguous,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingAction => "Missing 'Action:' after 'Thought:'",
            Self::MissingActionInput => "Missing 'Action Input:' after 'Action:'",
            Self::Ambiguous => "Output contains both a final answer and a parse-able action",
        })
    }
}

impl std::error::Error for ParseError {}

/// Decode one step of model output.
///
/// # Errors
///
/// Returns a [`ParseError`] describing what the output is missing.
pub fn parse_step(text: &str) -> Result<ReactStep, ParseError> {
    let action = find_action(text);
    let answer = text
        .find(FINAL_ANSWER)
        .map(|at| text[at.saturating_add(FINAL_ANSWER.len())..].trim().to_string());

    match (action, answer) {
        (Some(Ok(_)), Some(_)) => Err(ParseError::Ambiguous),
        (Some(Ok((tool, input))), None) => Ok(ReactStep::Action { tool, input }),
        (_, Some(answer)) => Ok(ReactStep::Finish { answer }),
        (Some(Err(e)), None) => Err(e),
        (None, None) => Err(ParseError::MissingAction),
    }
}

fn find_action(text: &str) -> Option<Result<(String, String), ParseError>> {
    let mut lines = text.lines().enumerate();
    let (index, tool) = lines.find_map(|(i, line)| {
        line.trim_start()
            .strip_prefix(ACTION)
            .map(|rest| (i, rest.trim().to_string()))
    })?;

    let remaining: Vec<&str> = text.lines().skip(index.saturating_add(1)).collect();
    let Some(position) = remaining
        .iter()
        .position(|line| line.trim_start().starts_with(ACTION_INPUT))
    else {
        return Some(Err(ParseError::MissingActionInput));
    };

    let first = remaining[position]
        .trim_start()
        .trim_start_matches(ACTION_INPUT);
    let mut input = first.to_string();
    for line in &remaining[position.saturating_add(1)..] {
        if line.trim_start().starts_with("Observation:") {
            break;
        }
        input.push('\n');
        input.push_str(line);
    }

    Some(Ok((tool, clean_input(&input))))
}

fn clean_input(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_with_input() {
        let text = "Thought: I should look at the graph\nAction: read_graph\nAction Input: \"all\"";
        assert_eq!(
            parse_step(text),
            Ok(ReactStep::Action {
                tool: "read_graph".into(),
                input: "all".into(),
            })
        );
    }

    #[test]
    fn test_multiline_input_stops_at_observation() {
        let text = "Action: read_graph\nAction Input: {\n  \"depth\": 1\n}\nObservation: ignored";
        let Ok(ReactStep::Action { input, .. }) = parse_step(text) else {
            panic!("expected action");
        };
        assert_eq!(input, "{\n  \"depth\": 1\n}");
    }

    #[test]
    fn test_final_answer() {
        let text = "Thought: I now know the final answer\nFinal Answer: Alice works at Contoso.";
        assert_eq!(
            parse_step(text),
            Ok(ReactStep::Finish {
                answer: "Alice works at Contoso.".into()
            })
        );
    }

    #[test]
    fn test_final_answer_wins_over_incomplete_action() {
        let text = "Action: read_graph\nFinal Answer: nothing to look up";
        assert!(matches!(parse_step(text), Ok(ReactStep::Finish { .. })));
    }

    #[test]
    fn test_both_action_and_answer_is_ambiguous() {
        let text = "Action: read_graph\nAction Input: {}\nFinal Answer: done";
        assert_eq!(parse_step(text), Err(ParseError::Ambiguous));
    }

    #[test]
    fn test_missing_action() {
        assert_eq!(
            parse_step("I think the answer is 42."),
            Err(ParseError::MissingAction)
        );
    }

    #[test]
    fn test_missing_action_input() {
        assert_eq!(
            parse_step("Thought: hmm\nAction: read_graph"),
            Err(ParseError::MissingActionInput)
        );
    }

    #[test]
    fn test_action_input_not_confused_with_action() {
        // An 'Action Input:' line must not be read as the action name.
        assert_eq!(
            parse_step("Action Input: {}"),
            Err(ParseError::MissingAction)
        );
    }
}
