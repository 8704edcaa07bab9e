//! Transcript types: messages, tool calls and the conversation that owns them.

use serde::{Deserialize, Serialize};

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call id, unique within the assistant message that produced it.
    pub id: String,
    pub name: String,
    /// Argument payload as produced by the model (JSON text, possibly malformed).
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Output of one executed tool call, keyed by the originating call id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub name: String,
    pub content: String,
    pub is_error: bool,
}

/// An assistant turn is either a final answer or a non-empty set of tool calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AssistantMessage {
    Answer(String),
    ToolCalls(Vec<ToolCall>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System { content: String },
    User { content: String },
    Assistant { message: AssistantMessage },
    Tool { result: ToolResult },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System { content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::User { content: content.into() }
    }

    pub fn answer(content: impl Into<String>) -> Self {
        Message::Assistant {
            message: AssistantMessage::Answer(content.into()),
        }
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Message::Assistant {
            message: AssistantMessage::ToolCalls(calls),
        }
    }

    pub fn tool_result(result: ToolResult) -> Self {
        Message::Tool { result }
    }

    pub fn role(&self) -> &'static str {
        match self {
            Message::System { .. } => "system",
            Message::User { .. } => "user",
            Message::Assistant { .. } => "assistant",
            Message::Tool { .. } => "tool",
        }
    }
}

/// Ordered message history for one loop run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the system message. There is at most one and it always comes first.
    pub fn with_system(mut self, content: impl Into<String>) -> Self {
        let system = Message::system(content);
        match self.messages.first_mut() {
            Some(first @ Message::System { .. }) => *first = system,
            _ => self.messages.insert(0, system),
        }
        self
    }

    pub fn with_user(mut self, content: impl Into<String>) -> Self {
        self.push_user(content);
        self
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Tool results in transcript order.
    pub fn tool_results(&self) -> impl Iterator<Item = &ToolResult> {
        self.messages.iter().filter_map(|m| match m {
            Message::Tool { result } => Some(result),
            _ => None,
        })
    }
}

impl From<Vec<Message>> for Conversation {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_message_is_unique_and_first() {
        let conversation = Conversation::new()
            .with_user("hi")
            .with_system("first")
            .with_system("second");

        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[0], Message::system("second"));
        assert_eq!(conversation.messages()[1].role(), "user");
    }

    #[test]
    fn messages_serialize_with_role_tag() {
        let message = Message::tool_calls(vec![ToolCall::new("call_1", "get_weather", r#"{"city":"Paris"}"#)]);
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["message"]["kind"], "tool_calls");
        assert_eq!(value["message"]["value"][0]["name"], "get_weather");
    }
}
