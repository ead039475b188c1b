//! Azure OpenAI chat client.
//!
//! Implements the [`ChatModel`] port over the chat-completions REST
//! protocol. `rebind` clones the client under altered configuration —
//! the `reqwest::Client` inside is itself a cheap handle, so derived
//! clients share the connection pool.

use super::sse::{DONE_MARKER, LineBuffer, data_payload};
use super::types::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ErrorBody, WireMessage,
};
use crate::config::FileModelConfig;
use async_trait::async_trait;
use counsel_application::ports::chat_model::{
    Binding, ChatModel, GenerationOptions, ModelError, RetryPolicy, TokenStream,
};
use counsel_domain::Message;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct AzureChatClient {
    http: reqwest::Client,
    model: String,
    endpoint: String,
    api_version: String,
    api_key: String,
    options: GenerationOptions,
    retry: RetryPolicy,
    tools: Option<Vec<serde_json::Value>>,
    response_format: Option<serde_json::Value>,
}

impl AzureChatClient {
    /// Build a client from validated configuration.
    ///
    /// Missing credentials are a constructor failure, not a first-call
    /// surprise.
    pub fn new(config: &FileModelConfig) -> Result<Self, ModelError> {
        if config.api_key.is_empty() {
            return Err(ModelError::UnsupportedBinding(
                "model.api_key is not configured".to_string(),
            ));
        }
        if config.endpoint.is_empty() {
            return Err(ModelError::UnsupportedBinding(
                "model.endpoint is not configured".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ModelError::Transport {
                message: e.to_string(),
                status: None,
            })?;

        Ok(Self {
            http,
            model: config.name.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            api_key: config.api_key.clone(),
            options: GenerationOptions {
                temperature: config.temperature,
                max_tokens: config.max_tokens,
                reasoning_effort: config.reasoning_effort.clone(),
            },
            retry: RetryPolicy {
                max_retries: config.max_retries,
                ..RetryPolicy::default()
            },
            tools: None,
            response_format: None,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.model, self.api_version
        )
    }

    fn request_body(&self, messages: &[Message], stream: bool) -> ChatCompletionRequest {
        ChatCompletionRequest {
            messages: messages.iter().map(WireMessage::from).collect(),
            temperature: self.options.temperature,
            max_completion_tokens: self.options.max_tokens,
            reasoning_effort: self.options.reasoning_effort.clone(),
            tools: self.tools.clone(),
            response_format: self.response_format.clone(),
            stream,
        }
    }

    /// POST with bounded retry on retryable failures.
    async fn post(&self, messages: &[Message], stream: bool) -> Result<reqwest::Response, ModelError> {
        let body = self.request_body(messages, stream);
        let mut attempt: u32 = 0;
        loop {
            let sent = self
                .http
                .post(self.url())
                .header("api-key", &self.api_key)
                .json(&body)
                .send()
                .await;

            let error = match sent {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => status_error(response).await,
                Err(e) if e.is_timeout() => ModelError::Timeout,
                Err(e) => ModelError::Transport {
                    message: e.to_string(),
                    status: None,
                },
            };

            if attempt < self.retry.max_retries && error.is_retryable() {
                attempt += 1;
                let backoff = Duration::from_millis(self.retry.backoff_ms * u64::from(attempt));
                warn!(
                    model = %self.model,
                    attempt,
                    "retrying after {backoff:?}: {error}"
                );
                tokio::time::sleep(backoff).await;
                continue;
            }
            return Err(error);
        }
    }
}

/// Read the error body and classify the failed response.
async fn status_error(response: reqwest::Response) -> ModelError {
    let status = response.status().as_u16();
    let retry_after_ms = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(|secs| secs * 1000);
    let body = response.text().await.unwrap_or_default();

    let (code, message) = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) if !parsed.error.message.is_empty() => (parsed.error.code, parsed.error.message),
        _ => (None, body),
    };
    classify_status(status, code.as_deref(), message, retry_after_ms)
}

/// Pure mapping of (status, provider code, message) onto [`ModelError`].
fn classify_status(
    status: u16,
    code: Option<&str>,
    message: String,
    retry_after_ms: Option<u64>,
) -> ModelError {
    match (status, code) {
        (429, _) => ModelError::RateLimited {
            message,
            retry_after_ms,
        },
        (_, Some("content_filter")) => ModelError::ContentFiltered(message),
        (400, _) if message.contains("content management policy") => {
            ModelError::ContentFiltered(message)
        }
        _ => ModelError::Transport {
            message,
            status: Some(status),
        },
    }
}

#[async_trait]
impl ChatModel for AzureChatClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, messages: &[Message]) -> Result<String, ModelError> {
        let response = self.post(messages, false).await?;
        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ModelError::MalformedCompletion(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        if content.is_empty() {
            return Err(ModelError::EmptyCompletion);
        }
        Ok(content)
    }

    async fn stream(&self, messages: &[Message]) -> Result<TokenStream, ModelError> {
        let response = self.post(messages, true).await?;
        debug!(model = %self.model, "completion stream opened");

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut lines = LineBuffer::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ModelError::Transport {
                                message: e.to_string(),
                                status: None,
                            }))
                            .await;
                        return;
                    }
                };
                lines.push(&chunk);
                while let Some(line) = lines.next_line() {
                    if forward_line(&line, &tx).await.is_break() {
                        return;
                    }
                }
            }
            if let Some(line) = lines.remainder() {
                let _ = forward_line(&line, &tx).await;
            }
        });
        Ok(TokenStream::new(rx))
    }

    fn rebind(&self, binding: Binding) -> Result<Arc<dyn ChatModel>, ModelError> {
        let mut derived = self.clone();
        match binding {
            Binding::Tools(tools) => derived.tools = Some(tools),
            Binding::StructuredOutput(schema) => {
                derived.response_format = Some(serde_json::json!({
                    "type": "json_schema",
                    "json_schema": {"name": "structured_output", "schema": schema},
                }));
            }
            Binding::Options(options) => derived.options = options,
            Binding::Retry(policy) => derived.retry = policy,
        }
        Ok(Arc::new(derived))
    }
}

/// Decode one SSE line and forward its content fragment, if any.
///
/// Returns `Break` when the stream is done (sentinel, decode failure, or a
/// gone consumer).
async fn forward_line(
    line: &str,
    tx: &mpsc::Sender<Result<String, ModelError>>,
) -> std::ops::ControlFlow<()> {
    use std::ops::ControlFlow;

    if line.is_empty() {
        return ControlFlow::Continue(());
    }
    let Some(data) = data_payload(line) else {
        return ControlFlow::Continue(());
    };
    if data == DONE_MARKER {
        return ControlFlow::Break(());
    }

    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => {
            let content = chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .unwrap_or_default();
            if !content.is_empty() && tx.send(Ok(content)).await.is_err() {
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        }
        Err(e) => {
            let _ = tx
                .send(Err(ModelError::MalformedCompletion(format!(
                    "undecodable stream chunk: {e}"
                ))))
                .await;
            ControlFlow::Break(())
        }
    }
}
