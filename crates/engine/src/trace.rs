//! Observers for loop events. Sinks never influence the run itself.

use std::sync::Mutex;

use courier_shared::LoopEvent;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub trait TraceSink: Send + Sync {
    fn record(&self, event: &LoopEvent);
}

/// Emits every event as a structured `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn record(&self, event: &LoopEvent) {
        match event {
            LoopEvent::RunStarted { run_id, max_iterations } => {
                info!(%run_id, max_iterations, "run started");
            }
            LoopEvent::ModelRequest { run_id, iteration, message_count } => {
                debug!(%run_id, iteration, message_count, "model request");
            }
            LoopEvent::ToolCall { run_id, call_id, tool, arguments } => {
                info!(%run_id, call_id = %call_id, tool = %tool, arguments = %arguments, "tool call");
            }
            LoopEvent::ToolResult { run_id, call_id, tool, result, is_error, truncated } => {
                if *is_error {
                    warn!(%run_id, call_id = %call_id, tool = %tool, result = %result, "tool failed");
                } else {
                    debug!(%run_id, call_id = %call_id, tool = %tool, truncated, result = %result, "tool result");
                }
            }
            LoopEvent::Answer { run_id, iterations, content } => {
                info!(%run_id, iterations, len = content.len(), "answer");
            }
            LoopEvent::Exhausted { run_id, iterations } => {
                warn!(%run_id, iterations, "iteration budget exhausted");
            }
            LoopEvent::Failed { run_id, message } => {
                warn!(%run_id, %message, "run failed");
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LoopEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LoopEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl TraceSink for MemorySink {
    fn record(&self, event: &LoopEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

const BROADCAST_CAPACITY: usize = 100;

/// Fans events out to live subscribers. Events sent with no subscriber are dropped.
pub struct BroadcastSink {
    tx: broadcast::Sender<LoopEvent>,
}

impl BroadcastSink {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LoopEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceSink for BroadcastSink {
    fn record(&self, event: &LoopEvent) {
        let _ = self.tx.send(event.clone());
    }
}
