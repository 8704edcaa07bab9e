use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest tool result carried verbatim in a [`LoopEvent::ToolResult`].
pub const RESULT_PREVIEW_CHARS: usize = 500;

/// Observability record emitted while a tool-calling loop runs.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoopEvent {
    RunStarted {
        run_id: Uuid,
        max_iterations: usize,
    },
    ModelRequest {
        run_id: Uuid,
        iteration: usize,
        message_count: usize,
    },
    ToolCall {
        run_id: Uuid,
        call_id: String,
        tool: String,
        arguments: String,
    },
    ToolResult {
        run_id: Uuid,
        call_id: String,
        tool: String,
        result: String,
        is_error: bool,
        truncated: bool,
    },
    Answer {
        run_id: Uuid,
        iterations: usize,
        content: String,
    },
    Exhausted {
        run_id: Uuid,
        iterations: usize,
    },
    Failed {
        run_id: Uuid,
        message: String,
    },
}

impl LoopEvent {
    pub fn tool_result(run_id: Uuid, call_id: &str, tool: &str, result: &str, is_error: bool) -> Self {
        let total = result.chars().count();
        let truncated = total > RESULT_PREVIEW_CHARS;
        let result = if truncated {
            let head: String = result.chars().take(RESULT_PREVIEW_CHARS).collect();
            format!("{}... ({} chars total)", head, total)
        } else {
            result.to_string()
        };

        LoopEvent::ToolResult {
            run_id,
            call_id: call_id.to_string(),
            tool: tool.to_string(),
            result,
            is_error,
            truncated,
        }
    }

    pub fn run_id(&self) -> Uuid {
        match self {
            LoopEvent::RunStarted { run_id, .. }
            | LoopEvent::ModelRequest { run_id, .. }
            | LoopEvent::ToolCall { run_id, .. }
            | LoopEvent::ToolResult { run_id, .. }
            | LoopEvent::Answer { run_id, .. }
            | LoopEvent::Exhausted { run_id, .. }
            | LoopEvent::Failed { run_id, .. } => *run_id,
        }
    }

    /// True for the event that closes a run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoopEvent::Answer { .. } | LoopEvent::Exhausted { .. } | LoopEvent::Failed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_results_are_truncated_on_char_boundaries() {
        let long = "é".repeat(RESULT_PREVIEW_CHARS + 20);
        let event = LoopEvent::tool_result(Uuid::nil(), "call_1", "dump", &long, false);
        match event {
            LoopEvent::ToolResult { result, truncated, .. } => {
                assert!(truncated);
                assert!(result.ends_with("... (520 chars total)"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = LoopEvent::Exhausted { run_id: Uuid::nil(), iterations: 5 };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "exhausted");
        assert_eq!(value["iterations"], 5);
        assert!(event.is_terminal());
    }
}
