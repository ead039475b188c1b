//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Secrets (the model API key) are normally supplied through the
//! environment rather than the file.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("server.port cannot be 0")]
    InvalidPort,

    #[error("model.name cannot be empty")]
    EmptyModelName,

    #[error("model.endpoint cannot be empty")]
    EmptyEndpoint,

    #[error("model.api_key is not set (use counsel.toml [model] or COUNSEL_MODEL__API_KEY)")]
    MissingApiKey,

    #[error("history.max_turns cannot be 0")]
    InvalidMaxTurns,
}

/// HTTP server binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Model deployment and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    /// Deployment name.
    pub name: String,
    /// Azure OpenAI resource endpoint.
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    /// Bounded retry for retryable invocation failures.
    pub max_retries: u32,
    pub reasoning_effort: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            name: "gpt-4o".to_string(),
            endpoint: String::new(),
            api_key: String::new(),
            api_version: "2024-10-21".to_string(),
            max_retries: 3,
            reasoning_effort: Some("minimal".to_string()),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// History replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHistoryConfig {
    /// Turns replayed into a new request.
    pub max_turns: usize,
}

impl Default for FileHistoryConfig {
    fn default() -> Self {
        Self { max_turns: 10 }
    }
}

/// Turn persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePersistenceConfig {
    /// Base directory of the JSONL store. Unset means in-memory only.
    pub path: Option<String>,
}

/// Log output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for daily-rolling log files. Unset logs to stderr only.
    pub dir: Option<String>,
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server: FileServerConfig,
    pub model: FileModelConfig,
    pub history: FileHistoryConfig,
    pub persistence: FilePersistenceConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }
        if self.model.name.is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        if self.model.endpoint.is_empty() {
            return Err(ConfigValidationError::EmptyEndpoint);
        }
        if self.model.api_key.is_empty() {
            return Err(ConfigValidationError::MissingApiKey);
        }
        if self.history.max_turns == 0 {
            return Err(ConfigValidationError::InvalidMaxTurns);
        }
        Ok(())
    }
}
