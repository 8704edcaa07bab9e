// Ollama /api/chat adapter. Non-streaming only.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use courier_shared::Tool;

use super::{ModelProvider, ModelReply, ModelRequest};
use crate::error::ProviderError;
use crate::message::{AssistantMessage, Message, ToolCall};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Tool]>,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
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
    function: FunctionCall,
}

#[derive(Deserialize, Debug)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

pub struct OllamaProvider {
    base_url: String,
    client: Client,
}

impl OllamaProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    fn build_request<'a>(&self, request: &ModelRequest<'a>) -> ChatRequest<'a> {
        ChatRequest {
            model: request.model,
            messages: request.messages.iter().map(to_wire_message).collect(),
            stream: false,
            tools: (!request.tools.is_empty()).then_some(request.tools),
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
            // Ollama expects arguments as an object, not JSON text.
            let tool_calls: Vec<Value> = calls
                .iter()
                .map(|call| {
                    let arguments = serde_json::from_str::<Value>(&call.arguments)
                        .ok()
                        .filter(Value::is_object)
                        .unwrap_or_else(|| Value::Object(Map::new()));
                    json!({ "function": { "name": call.name, "arguments": arguments } })
                })
                .collect();
            json!({ "role": "assistant", "content": "", "tool_calls": tool_calls })
        }
        Message::Tool { result } => json!({
            "role": "tool",
            "content": result.content,
            "tool_name": result.name
        }),
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelReply, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = self.build_request(&request);

        debug!(model = request.model, %url, iteration = request.iteration, "calling ollama chat");

        let response = self.client.post(&url).json(&body).send().await?;

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

        // Ollama does not assign call ids.
        let calls = parsed
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, tc)| {
                let arguments = match tc.function.arguments {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                ToolCall::new(
                    format!("call_{}_{}", request.iteration, index),
                    tc.function.name,
                    arguments,
                )
            })
            .collect();

        Ok(ModelReply::from_parts(parsed.message.content, calls))
    }
}
