//! The tool-calling loop.
//!
//! transcript → model → either a final answer, or tool calls that are
//! executed in order and appended → model again, until the model answers or
//! the iteration budget runs out.

use std::fmt;
use std::sync::Arc;

use courier_shared::{LoopEvent, Tool, ToolRegistry, ToolSpec};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::message::{Conversation, Message, ToolCall, ToolResult};
use crate::provider::{ModelProvider, ModelReply, ModelRequest, ToolPolicy};
use crate::trace::TraceSink;

/// Text shown for a run that used its whole budget without answering.
pub const EXHAUSTED_SENTINEL: &str = "Error: max iterations reached";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The model's final text, unchanged.
    Answer(String),
    Exhausted { iterations: usize },
}

impl LoopOutcome {
    pub fn is_answer(&self) -> bool {
        matches!(self, LoopOutcome::Answer(_))
    }

    pub fn answer(&self) -> Option<&str> {
        match self {
            LoopOutcome::Answer(text) => Some(text),
            LoopOutcome::Exhausted { .. } => None,
        }
    }
}

impl fmt::Display for LoopOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopOutcome::Answer(text) => f.write_str(text),
            LoopOutcome::Exhausted { .. } => f.write_str(EXHAUSTED_SENTINEL),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoopReport {
    pub run_id: Uuid,
    pub outcome: LoopOutcome,
    /// Model requests issued.
    pub iterations: usize,
    pub transcript: Conversation,
}

pub struct ToolLoop {
    config: EngineConfig,
    provider: Arc<dyn ModelProvider>,
    registry: Arc<ToolRegistry>,
    tools: Vec<Tool>,
    sink: Option<Arc<dyn TraceSink>>,
}

impl ToolLoop {
    pub fn new(
        config: EngineConfig,
        provider: Arc<dyn ModelProvider>,
        registry: Arc<ToolRegistry>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let tools = registry.tools();
        Ok(Self {
            config,
            provider,
            registry,
            tools,
            sink: None,
        })
    }

    /// Advertise these specs instead of the registry's own. Calls are still
    /// dispatched through the registry.
    pub fn with_specs(mut self, specs: Vec<ToolSpec>) -> Self {
        for spec in specs.iter().filter(|s| !self.registry.contains(&s.name)) {
            warn!(tool = %spec.name, "advertised tool has no handler; calls to it will fail");
        }
        self.tools = specs.iter().map(ToolSpec::to_tool).collect();
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Runs one question through a fresh `[system?, user]` conversation.
    pub async fn ask(&self, user_message: &str) -> Result<LoopOutcome, EngineError> {
        let mut conversation = Conversation::new().with_user(user_message);
        if let Some(prompt) = &self.config.system_prompt {
            conversation = conversation.with_system(prompt.clone());
        }
        Ok(self.run(conversation).await?.outcome)
    }

    pub async fn run(&self, conversation: Conversation) -> Result<LoopReport, EngineError> {
        let run_id = Uuid::new_v4();
        let max_iterations = self.config.max_iterations;
        let mut transcript = conversation;

        info!(%run_id, provider = self.provider.name(), model = self.config.model(), max_iterations, "starting tool loop");
        self.emit(LoopEvent::RunStarted { run_id, max_iterations });

        for iteration in 1..=max_iterations {
            debug!(%run_id, iteration, message_count = transcript.len(), "requesting model");
            self.emit(LoopEvent::ModelRequest {
                run_id,
                iteration,
                message_count: transcript.len(),
            });

            let request = ModelRequest {
                model: self.config.model(),
                messages: transcript.messages(),
                tools: &self.tools,
                policy: ToolPolicy::default(),
                iteration,
            };

            let reply = match self.provider.complete(request).await {
                // an assistant turn carries at least one call, or it is an answer
                Ok(ModelReply::ToolCalls(calls)) if calls.is_empty() => ModelReply::Answer(String::new()),
                Ok(reply) => reply,
                Err(e) => {
                    warn!(%run_id, iteration, err = %e, "model request failed");
                    self.emit(LoopEvent::Failed { run_id, message: e.to_string() });
                    return Err(e.into());
                }
            };

            match reply {
                ModelReply::Answer(text) => {
                    info!(%run_id, iterations = iteration, "model answered");
                    self.emit(LoopEvent::Answer {
                        run_id,
                        iterations: iteration,
                        content: text.clone(),
                    });
                    transcript.push(Message::answer(text.clone()));
                    return Ok(LoopReport {
                        run_id,
                        outcome: LoopOutcome::Answer(text),
                        iterations: iteration,
                        transcript,
                    });
                }
                ModelReply::ToolCalls(calls) => {
                    debug!(%run_id, iteration, count = calls.len(), "model requested tools");
                    transcript.push(Message::tool_calls(calls.clone()));
                    for call in &calls {
                        let result = self.execute(run_id, call);
                        transcript.push(Message::tool_result(result));
                    }
                }
            }
        }

        warn!(%run_id, iterations = max_iterations, "iteration budget exhausted without an answer");
        self.emit(LoopEvent::Exhausted { run_id, iterations: max_iterations });

        Ok(LoopReport {
            run_id,
            outcome: LoopOutcome::Exhausted { iterations: max_iterations },
            iterations: max_iterations,
            transcript,
        })
    }

    fn execute(&self, run_id: Uuid, call: &ToolCall) -> ToolResult {
        info!(%run_id, call_id = %call.id, tool = %call.name, "executing tool");
        self.emit(LoopEvent::ToolCall {
            run_id,
            call_id: call.id.clone(),
            tool: call.name.clone(),
            arguments: call.arguments.clone(),
        });

        let outcome = self.registry.invoke(&call.name, &call.arguments);
        let is_error = outcome.is_error();
        let content = outcome.into_text();

        self.emit(LoopEvent::tool_result(run_id, &call.id, &call.name, &content, is_error));

        ToolResult {
            call_id: call.id.clone(),
            name: call.name.clone(),
            content,
            is_error,
        }
    }

    fn emit(&self, event: LoopEvent) {
        if let Some(sink) = &self.sink {
            sink.record(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, ProviderError};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl ModelProvider for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelReply, ProviderError> {
            let last = request.messages.last().map(|m| m.role()).unwrap_or("none");
            Ok(ModelReply::Answer(format!("last was {}", last)))
        }
    }

    #[test]
    fn exhausted_displays_sentinel() {
        let outcome = LoopOutcome::Exhausted { iterations: 3 };
        assert_eq!(outcome.to_string(), "Error: max iterations reached");
        assert!(!outcome.is_answer());
        assert_eq!(outcome.answer(), None);

        let outcome = LoopOutcome::Answer("hi".into());
        assert_eq!(outcome.answer(), Some("hi"));
        assert_eq!(outcome.to_string(), "hi");
    }

    #[test]
    fn zero_budget_is_rejected() {
        let config = EngineConfig { max_iterations: 0, ..EngineConfig::default() };
        let err = ToolLoop::new(config, Arc::new(Echo), Arc::new(ToolRegistry::empty())).err().unwrap();
        assert!(matches!(err, EngineError::Config(ConfigError::InvalidValue { .. })));
    }

    #[tokio::test]
    async fn ask_prepends_system_prompt() {
        let engine = ToolLoop::new(EngineConfig::default(), Arc::new(Echo), Arc::new(ToolRegistry::empty())).unwrap();
        assert_eq!(engine.ask("hello").await.unwrap(), LoopOutcome::Answer("last was user".into()));

        let report = engine
            .run(Conversation::new().with_user("hello").with_system("sys"))
            .await
            .unwrap();
        assert_eq!(report.transcript.len(), 3);
        assert_eq!(report.transcript.messages()[0], Message::system("sys"));
    }

    #[test]
    fn with_specs_overrides_advertised_tools() {
        let engine = ToolLoop::new(EngineConfig::default(), Arc::new(Echo), Arc::new(ToolRegistry::empty()))
            .unwrap()
            .with_specs(vec![ToolSpec::new("do_nothing", "Does nothing")]);
        assert_eq!(engine.tools().len(), 1);
        assert_eq!(engine.tools()[0].function.name, "do_nothing");
    }
}
