//! Model endpoint abstraction.
//!
//! The loop only needs three things from a provider: pass structured tool
//! specs, receive zero or more structured calls per response, and send call
//! results back keyed by call id. Wire formats live in the adapters.

pub mod ollama;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use courier_shared::Tool;
use tracing::debug;

use crate::config::{EngineConfig, ProviderKind};
use crate::error::ProviderError;
use crate::message::{Message, ToolCall};

pub use ollama::OllamaProvider;
pub use openai::OpenAiCompatProvider;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolChoice {
    /// The model decides whether to call tools.
    #[default]
    Auto,
}

impl ToolChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
        }
    }
}

/// Tool-use policy sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolPolicy {
    pub choice: ToolChoice,
    /// Calls are always executed one at a time; this asks the model not to
    /// batch them either.
    pub parallel_calls: bool,
}

impl Default for ToolPolicy {
    fn default() -> Self {
        Self {
            choice: ToolChoice::Auto,
            parallel_calls: false,
        }
    }
}

/// One outbound request: the transcript so far plus the advertised tools.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub tools: &'a [Tool],
    pub policy: ToolPolicy,
    /// 1-based iteration of the loop issuing this request.
    pub iteration: usize,
}

/// What the model answered: final text XOR a non-empty list of calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    Answer(String),
    ToolCalls(Vec<ToolCall>),
}

impl ModelReply {
    /// Normalizes a raw response. Text that accompanies tool calls is dropped.
    pub fn from_parts(content: Option<String>, calls: Vec<ToolCall>) -> Self {
        if calls.is_empty() {
            return ModelReply::Answer(content.unwrap_or_default());
        }
        if let Some(text) = content.as_deref().filter(|t| !t.trim().is_empty()) {
            debug!(len = text.len(), "dropping text that accompanied tool calls");
        }
        ModelReply::ToolCalls(calls)
    }
}

#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider identifier (e.g. "groq", "ollama").
    fn name(&self) -> &str;

    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelReply, ProviderError>;
}

/// Builds the provider adapter selected by `config`.
pub fn build_provider(config: &EngineConfig) -> Result<Arc<dyn ModelProvider>, ProviderError> {
    let timeout = config.request_timeout();
    match config.provider {
        ProviderKind::Groq | ProviderKind::OpenAi => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| ProviderError::MissingApiKey(config.provider.as_str().to_string()))?;
            Ok(Arc::new(OpenAiCompatProvider::new(
                config.provider.as_str(),
                api_key,
                config.base_url(),
                timeout,
            )?))
        }
        ProviderKind::Ollama => Ok(Arc::new(OllamaProvider::new(config.base_url(), timeout)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_alongside_calls_is_dropped() {
        let reply = ModelReply::from_parts(
            Some("Let me check.".into()),
            vec![ToolCall::new("call_1", "get_weather", "{}")],
        );
        assert!(matches!(reply, ModelReply::ToolCalls(ref calls) if calls.len() == 1));

        assert_eq!(ModelReply::from_parts(None, vec![]), ModelReply::Answer(String::new()));
    }

    #[test]
    fn hosted_providers_need_a_key() {
        let config = EngineConfig::default();
        let err = build_provider(&config).err().unwrap();
        assert!(matches!(err, ProviderError::MissingApiKey(ref p) if p == "groq"));

        let ollama = EngineConfig {
            provider: ProviderKind::Ollama,
            ..EngineConfig::default()
        };
        assert_eq!(build_provider(&ollama).unwrap().name(), "ollama");
    }
}
