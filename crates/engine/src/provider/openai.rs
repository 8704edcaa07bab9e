//! OpenAI Chat Completions adapter.
//!
//! Also covers OpenAI-compatible endpoints such as Groq.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use courier_shared::Tool;

use super::{ModelProvider, ModelReply, ModelRequest};
use crate::error::ProviderError;
use crate::message::{AssistantMessage, Message, ToolCall};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Tool]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parallel_tool_calls: Option<bool>,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Deserialize, Debug)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Deserialize, Debug)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

pub struct OpenAiCompatProvider {
    name: String,
    api_key: String,
    base_url: String,
    client: Client,
}

impl OpenAiCompatProvider {
    pub fn new(
        name: &str,
        api_key: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            name: name.to_string(),
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    fn build_request<'a>(&self, request: &ModelRequest<'a>) -> ChatRequest<'a> {
        let has_tools = !request.tools.is_empty();
        ChatRequest {
            model: request.model,
            messages: request.messages.iter().map(to_wire_message).collect(),
            tools: has_tools.then_some(request.tools),
            tool_choice: has_tools.then_some(request.policy.choice.as_str()),
            parallel_tool_calls: has_tools.then_some(request.policy.parallel_calls),
        }
    }
}

fn to_wire_message(message: &Message) -> Value {
    match message {
        Message::System { content } => json!({ "role": "system", "content": content }),
        Message::User { content } => json!({ "role": "user", "content": content }),
        Message::Assistant { message: AssistantMessage::Answer(content) } => {
            json!({ "role": "assistant", "content": content })
        }
        Message::Assistant { message: AssistantMessage::ToolCalls(calls) } => {
            let tool_calls: Vec<Value> = calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": { "name": call.name, "arguments": call.arguments }
                    })
                })
                .collect();
            json!({ "role": "assistant", "content": null, "tool_calls": tool_calls })
        }
        Message::Tool { result } => json!({
            "role": "tool",
            "tool_call_id": result.call_id,
            "content": result.content
        }),
    }
}

/// Arguments normally arrive as JSON text; some compatible servers send an object.
fn arguments_text(arguments: Value) -> String {
    match arguments {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl ModelProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelReply, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request(&request);

        debug!(provider = %self.name, model = request.model, %url, iteration = request.iteration, "calling chat completions");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ProviderError::MalformedResponse("response has no choices".to_string()))?;

        let calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: arguments_text(tc.function.arguments),
            })
            .collect();

        Ok(ModelReply::from_parts(message.content, calls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ToolResult;
    use crate::provider::ToolPolicy;
    use courier_shared::ToolSpec;

    #[test]
    fn request_carries_policy_only_with_tools() {
        let provider =
            OpenAiCompatProvider::new("groq", "key", "https://api.groq.com/openai/v1/", Duration::from_secs(5))
                .unwrap();
        assert_eq!(provider.base_url, "https://api.groq.com/openai/v1");

        let messages = vec![Message::user("hi")];
        let tools = vec![ToolSpec::new("get_weather", "weather").param("city", "string", "City").to_tool()];
        let with_tools = ModelRequest {
            model: "m",
            messages: &messages,
            tools: &tools,
            policy: ToolPolicy::default(),
            iteration: 1,
        };
        let body = serde_json::to_value(provider.build_request(&with_tools)).unwrap();
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["parallel_tool_calls"], false);
        assert_eq!(body["tools"][0]["function"]["name"], "get_weather");

        let without = ModelRequest { tools: &[], ..with_tools };
        let body = serde_json::to_value(provider.build_request(&without)).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
        assert!(body.get("parallel_tool_calls").is_none());
    }

    #[test]
    fn transcript_maps_to_chat_roles() {
        let calls = Message::tool_calls(vec![ToolCall::new("call_9", "get_weather", r#"{"city":"Paris"}"#)]);
        let wire = to_wire_message(&calls);
        assert_eq!(wire["content"], Value::Null);
        assert_eq!(wire["tool_calls"][0]["type"], "function");
        assert_eq!(wire["tool_calls"][0]["function"]["arguments"], r#"{"city":"Paris"}"#);

        let result = Message::tool_result(ToolResult {
            call_id: "call_9".into(),
            name: "get_weather".into(),
            content: "15°C, cloudy".into(),
            is_error: false,
        });
        let wire = to_wire_message(&result);
        assert_eq!(wire["role"], "tool");
        assert_eq!(wire["tool_call_id"], "call_9");
    }

    #[test]
    fn object_arguments_are_re_encoded() {
        assert_eq!(arguments_text(json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(arguments_text(Value::String("{}".into())), "{}");
        assert_eq!(arguments_text(Value::Null), "");
    }
}
