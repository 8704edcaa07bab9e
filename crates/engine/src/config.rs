//! Engine configuration.
//!
//! Settings come from an optional JSON file, then environment variables
//! (a `.env` file is honoured by the binary through `dotenvy`):
//! - `COURIER_PROVIDER` - `groq` (default), `openai` or `ollama`.
//! - `COURIER_BASE_URL` - Endpoint base URL. Defaults per provider.
//! - `COURIER_MODEL` - Model identifier. Defaults per provider.
//! - `COURIER_MAX_ITERATIONS` - Iteration budget per run. Defaults to `5`.
//! - `COURIER_SYSTEM_PROMPT` - System message prepended by `ToolLoop::ask`.
//! - `COURIER_TIMEOUT_SECS` - HTTP request timeout. Defaults to `60`.
//! - `COURIER_API_KEY`, or the provider's own `GROQ_API_KEY` / `OPENAI_API_KEY`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_MAX_ITERATIONS: usize = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Use the provided tools when needed to answer questions accurately.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Groq,
    #[value(name = "openai")]
    OpenAi,
    Ollama,
}

impl ProviderKind {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "https://api.groq.com/openai/v1",
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Ollama => "http://localhost:11434",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "llama-3.3-70b-versatile",
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Ollama => "qwen3:8b",
        }
    }

    /// Provider-specific environment variable holding the API key.
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Groq => Some("GROQ_API_KEY"),
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "groq",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Ollama => "ollama",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(ProviderKind::Groq),
            "openai" => Ok(ProviderKind::OpenAi),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(format!("unknown provider '{}'", other)),
        }
    }
}

/// Everything a `ToolLoop` needs to know about its endpoint and budget.
/// Constructed by the caller and passed in explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub provider: ProviderKind,
    pub base_url: Option<String>,
    pub model: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub max_iterations: usize,
    pub system_prompt: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: None,
            model: None,
            api_key: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for unparsable or out-of-range values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    pub fn load_with(
        path: impl AsRef<Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: EngineConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(provider) = lookup("COURIER_PROVIDER") {
            self.provider = provider.parse().map_err(|reason| ConfigError::InvalidValue {
                key: "COURIER_PROVIDER".to_string(),
                reason,
            })?;
        }
        if let Some(url) = lookup("COURIER_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Some(model) = lookup("COURIER_MODEL") {
            self.model = Some(model);
        }
        if let Some(value) = lookup("COURIER_MAX_ITERATIONS") {
            self.max_iterations = parse_number("COURIER_MAX_ITERATIONS", &value)?;
        }
        if let Some(prompt) = lookup("COURIER_SYSTEM_PROMPT") {
            self.system_prompt = if prompt.trim().is_empty() { None } else { Some(prompt) };
        }
        if let Some(value) = lookup("COURIER_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_number("COURIER_TIMEOUT_SECS", &value)?;
        }

        let key = lookup("COURIER_API_KEY")
            .or_else(|| self.provider.api_key_var().and_then(|var| lookup(var)));
        if key.is_some() {
            self.api_key = key;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_iterations".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "model".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(self.provider.default_model())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(self.provider.default_base_url())
            .trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
