use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::Result;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::schemas::{Tool, ToolSpec};

/// A locally executable tool: named arguments in, a value (or an error) out.
pub trait ToolHandler: Send + Sync {
    fn call(&self, args: &Map<String, Value>) -> Result<Value>;
}

impl<F, R> ToolHandler for F
where
    F: Fn(&Map<String, Value>) -> Result<R> + Send + Sync,
    R: Into<Value>,
{
    fn call(&self, args: &Map<String, Value>) -> Result<Value> {
        self(args).map(Into::into)
    }
}

/// A group of related tools backed by one struct.
///
/// Usually implemented through [`register_toolbelt!`](crate::register_toolbelt).
pub trait Toolbelt: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn specs(&self) -> Vec<ToolSpec>;
    /// Dispatches to the named tool. `None` when the toolbelt has no such tool.
    fn call(&self, tool: &str, args: &Map<String, Value>) -> Option<Result<Value>>;
}

/// Result of invoking a tool: always text, flagged as success or failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Success(String),
    Failure(String),
}

impl ToolOutcome {
    pub fn text(&self) -> &str {
        match self {
            ToolOutcome::Success(text) | ToolOutcome::Failure(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ToolOutcome::Success(text) | ToolOutcome::Failure(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutcome::Failure(_))
    }
}

impl fmt::Display for ToolOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool '{0}' is registered more than once")]
    DuplicateTool(String),
}

/// Name → handler map plus the specs advertised to the model.
///
/// Built once and read-only afterwards; share it behind an `Arc`.
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    specs: Vec<ToolSpec>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
            specs: Vec::new(),
        }
    }

    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// Specs in the function-calling wire format.
    pub fn tools(&self) -> Vec<Tool> {
        self.specs.iter().map(ToolSpec::to_tool).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs the named tool with the raw JSON argument payload from the model.
    ///
    /// Never fails: unknown tools, undecodable arguments, handler errors and
    /// handler panics all come back as [`ToolOutcome::Failure`].
    pub fn invoke(&self, name: &str, raw_args: &str) -> ToolOutcome {
        let Some(handler) = self.handlers.get(name) else {
            warn!(tool = name, "model requested an unknown tool");
            return ToolOutcome::Failure(format!("Error: unknown tool '{}'", name));
        };

        let args = match decode_arguments(raw_args) {
            Ok(args) => args,
            Err(reason) => {
                warn!(tool = name, %reason, "could not decode tool arguments");
                return ToolOutcome::Failure(format!(
                    "Error: invalid arguments for tool '{}': {}",
                    name, reason
                ));
            }
        };

        match panic::catch_unwind(AssertUnwindSafe(|| handler.call(&args))) {
            Ok(Ok(value)) => {
                debug!(tool = name, "tool succeeded");
                ToolOutcome::Success(value_to_text(value))
            }
            Ok(Err(e)) => {
                warn!(tool = name, err = %e, "tool returned an error");
                ToolOutcome::Failure(format!("Error: {}", e))
            }
            Err(_) => {
                warn!(tool = name, "tool panicked");
                ToolOutcome::Failure(format!("Error: tool '{}' panicked", name))
            }
        }
    }
}

#[derive(Default)]
pub struct ToolRegistryBuilder {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    specs: Vec<ToolSpec>,
    duplicates: Vec<String>,
}

impl ToolRegistryBuilder {
    /// Registers a closure (or fn) as the handler for `spec`.
    pub fn tool<F, R>(self, spec: ToolSpec, handler: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> Result<R> + Send + Sync + 'static,
        R: Into<Value>,
    {
        self.handler(spec, Arc::new(handler))
    }

    pub fn handler(mut self, spec: ToolSpec, handler: Arc<dyn ToolHandler>) -> Self {
        if self.handlers.contains_key(&spec.name) {
            self.duplicates.push(spec.name.clone());
            return self;
        }
        self.handlers.insert(spec.name.clone(), handler);
        self.specs.push(spec);
        self
    }

    /// Registers every tool of a toolbelt.
    pub fn toolbelt<T: Toolbelt>(mut self, toolbelt: T) -> Self {
        let belt: Arc<dyn Toolbelt> = Arc::new(toolbelt);
        let specs = belt.specs();
        debug!(
            toolbelt = belt.name(),
            description = belt.description(),
            tools = specs.len(),
            "registering toolbelt"
        );
        for spec in specs {
            let belt = Arc::clone(&belt);
            let tool = spec.name.clone();
            let handler = move |args: &Map<String, Value>| -> Result<Value> {
                belt.call(&tool, args).unwrap_or_else(|| {
                    Err(anyhow::anyhow!(
                        "toolbelt '{}' has no tool '{}'",
                        belt.name(),
                        tool
                    ))
                })
            };
            self = self.handler(spec, Arc::new(handler));
        }
        self
    }

    pub fn build(self) -> std::result::Result<ToolRegistry, RegistryError> {
        if let Some(name) = self.duplicates.into_iter().next() {
            return Err(RegistryError::DuplicateTool(name));
        }
        Ok(ToolRegistry {
            handlers: self.handlers,
            specs: self.specs,
        })
    }
}

/// Decodes the model's argument payload into a named-argument map.
/// An empty or `null` payload means "no arguments".
pub fn decode_arguments(raw: &str) -> std::result::Result<Map<String, Value>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(format!("expected a JSON object, got {}", json_kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

/// Tool results always enter the transcript as text.
pub fn value_to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
