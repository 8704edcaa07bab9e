pub mod config;
pub mod error;
pub mod message;
pub mod provider;
pub mod tool_loop;
pub mod trace;

pub use config::{EngineConfig, ProviderKind};
pub use error::{ConfigError, EngineError, ProviderError};
pub use message::{AssistantMessage, Conversation, Message, ToolCall, ToolResult};
pub use provider::{build_provider, ModelProvider, ModelReply, ModelRequest, ToolChoice, ToolPolicy};
pub use tool_loop::{LoopOutcome, LoopReport, ToolLoop, EXHAUSTED_SENTINEL};
pub use trace::{BroadcastSink, MemorySink, TraceSink, TracingSink};
