//! Chat model port
//!
//! Defines the interface for the remote generative-model client. The
//! operations fall into two declared categories: *invocation* operations
//! (`invoke`, `stream`, `invoke_batch`) that talk to the provider, and the
//! *chaining* capability (`rebind`) that produces a derived client under
//! altered configuration without mutating the original. Anything else an
//! adapter can do is reached through the concrete adapter type, not through
//! this port.

use async_trait::async_trait;
use counsel_domain::Message;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur inside a model client adapter.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
    },

    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after_ms: Option<u64>,
    },

    #[error("Content rejected by provider policy: {0}")]
    ContentFiltered(String),

    #[error("Model returned an empty completion")]
    EmptyCompletion,

    #[error("Malformed completion: {0}")]
    MalformedCompletion(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request timeout")]
    Timeout,

    #[error("Transport closed")]
    Closed,

    #[error("Unsupported binding: {0}")]
    UnsupportedBinding(String),
}

impl ModelError {
    /// Upstream-provided HTTP status, when one exists.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ModelError::Transport { status, .. } => *status,
            ModelError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ModelError::RateLimited { .. } | ModelError::Timeout | ModelError::Closed => true,
            ModelError::Transport { status, .. } => {
                matches!(status, None | Some(500..=599) | Some(408))
            }
            _ => false,
        }
    }
}

/// Handle for receiving incremental content fragments from a streaming call.
///
/// Wraps an `mpsc::Receiver`; the adapter's pump task closes the channel
/// when the upstream stream ends, and sends at most one terminal `Err`.
pub struct TokenStream {
    pub receiver: mpsc::Receiver<Result<String, ModelError>>,
}

impl TokenStream {
    pub fn new(receiver: mpsc::Receiver<Result<String, ModelError>>) -> Self {
        Self { receiver }
    }

    pub async fn recv(&mut self) -> Option<Result<String, ModelError>> {
        self.receiver.recv().await
    }

    /// Consume the stream and collect all fragments into a single string.
    ///
    /// Useful when streaming at the transport level is wanted but only the
    /// final text matters.
    pub async fn collect_text(mut self) -> Result<String, ModelError> {
        let mut full_text = String::new();
        while let Some(item) = self.receiver.recv().await {
            full_text.push_str(&item?);
        }
        Ok(full_text)
    }
}

/// Runtime generation options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub reasoning_effort: Option<String>,
}

/// Retry/backoff policy applied to invocation attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_ms: 500,
        }
    }
}

/// A configuration change applied through [`ChatModel::rebind`].
#[derive(Debug, Clone)]
pub enum Binding {
    /// Tool definitions (JSON Schema payloads) the model may call.
    Tools(Vec<serde_json::Value>),
    /// Constrain output to the given JSON Schema.
    StructuredOutput(serde_json::Value),
    /// Runtime generation options.
    Options(GenerationOptions),
    /// Retry/backoff policy.
    Retry(RetryPolicy),
}

/// The remote generative-model client.
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier this client was built for.
    fn name(&self) -> &str;

    /// Single-shot call: send the full message sequence, get the response
    /// text.
    async fn invoke(&self, messages: &[Message]) -> Result<String, ModelError>;

    /// Streaming call: incremental content fragments.
    async fn stream(&self, messages: &[Message]) -> Result<TokenStream, ModelError>;

    /// Batched single-shot calls.
    ///
    /// Default implementation runs the batches sequentially; adapters with
    /// a native batch endpoint can override it.
    async fn invoke_batch(&self, batches: &[Vec<Message>]) -> Result<Vec<String>, ModelError> {
        let mut outputs = Vec::with_capacity(batches.len());
        for messages in batches {
            outputs.push(self.invoke(messages).await?);
        }
        Ok(outputs)
    }

    /// Produce a derived client under altered configuration. The original
    /// client is left untouched.
    fn rebind(&self, binding: Binding) -> Result<Arc<dyn ChatModel>, ModelError>;
}
