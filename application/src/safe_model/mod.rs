//! Resilient invocation proxy around a chat model client.
//!
//! [`SafeChatModel`] intercepts every invocation-style operation: a failure
//! from the underlying client is classified and re-raised as a single
//! [`InvocationError`] carrying a user-presentable message generated on a
//! side channel. Chaining operations (`bind_tools`, `with_structured_output`,
//! `with_options`, `with_retry`, `with_fallbacks`) return a **new** proxy
//! wrapping the derived client while preserving the original base client
//! and model name.
//!
//! The base client is set exactly once at construction and never replaced;
//! it serves error-message generation only, because the active client may
//! be in the misconfigured state that caused the failure being explained.

pub mod error;
pub mod fallback;
pub mod friendly;

pub use error::InvocationError;
pub use fallback::FallbackModel;

use crate::ports::chat_model::{
    Binding, ChatModel, GenerationOptions, ModelError, RetryPolicy,
};
use counsel_domain::{Message, latest_user_query};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::error;

/// Placeholder recorded when no user-authored message can be found in the
/// failing call's arguments.
pub const UNKNOWN_USER_QUERY: &str = "(질문 내용을 확인할 수 없습니다)";

#[derive(Clone)]
pub struct SafeChatModel {
    model_name: String,
    /// The possibly-rebound client serving invocations.
    active: Arc<dyn ChatModel>,
    /// The original client, reserved for error-message generation.
    base: Arc<dyn ChatModel>,
}

impl SafeChatModel {
    /// Wrap a freshly-constructed client. It becomes both the active target
    /// and the base used for error-message generation.
    pub fn new(client: Arc<dyn ChatModel>) -> Self {
        Self {
            model_name: client.name().to_string(),
            active: client.clone(),
            base: client,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// The active client, for capabilities the proxy does not declare.
    pub fn inner(&self) -> &Arc<dyn ChatModel> {
        &self.active
    }

    /// The original client. Never rebound.
    pub fn base(&self) -> &Arc<dyn ChatModel> {
        &self.base
    }

    // ==================== invocation operations ====================

    pub async fn invoke(&self, messages: &[Message]) -> Result<String, InvocationError> {
        match self.active.invoke(messages).await {
            Ok(text) => Ok(text),
            Err(e) => Err(self.intercept("invoke", query_of(messages), e).await),
        }
    }

    pub async fn invoke_batch(
        &self,
        batches: &[Vec<Message>],
    ) -> Result<Vec<String>, InvocationError> {
        match self.active.invoke_batch(batches).await {
            Ok(outputs) => Ok(outputs),
            Err(e) => {
                let query = batches
                    .iter()
                    .rev()
                    .find_map(|messages| latest_user_query(messages))
                    .unwrap_or(UNKNOWN_USER_QUERY)
                    .to_string();
                Err(self.intercept("invoke_batch", query, e).await)
            }
        }
    }

    /// Streaming call whose failures have already been normalized.
    ///
    /// Both the initial call and mid-stream iteration errors surface as
    /// [`InvocationError`]; a relay task converts the first upstream error
    /// into a terminal item and stops forwarding.
    pub async fn stream(&self, messages: &[Message]) -> Result<SafeTokenStream, InvocationError> {
        let user_query = query_of(messages);
        let mut inner = match self.active.stream(messages).await {
            Ok(stream) => stream,
            Err(e) => return Err(self.intercept("stream", user_query, e).await),
        };

        let (tx, rx) = mpsc::channel(32);
        let base = self.base.clone();
        let model_name = self.model_name.clone();
        tokio::spawn(async move {
            while let Some(item) = inner.recv().await {
                match item {
                    Ok(fragment) => {
                        if tx.send(Ok(fragment)).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        let raised =
                            raise(base.as_ref(), &model_name, "stream", user_query, e).await;
                        let _ = tx.send(Err(raised)).await;
                        return;
                    }
                }
            }
        });
        Ok(SafeTokenStream::new(rx))
    }

    // ==================== chaining operations ====================

    /// Bind tool definitions the model may call.
    pub fn bind_tools(&self, tools: Vec<serde_json::Value>) -> Result<Self, ModelError> {
        self.chain(Binding::Tools(tools))
    }

    /// Constrain output to the given JSON Schema.
    pub fn with_structured_output(&self, schema: serde_json::Value) -> Result<Self, ModelError> {
        self.chain(Binding::StructuredOutput(schema))
    }

    /// Apply runtime generation options.
    pub fn with_options(&self, options: GenerationOptions) -> Result<Self, ModelError> {
        self.chain(Binding::Options(options))
    }

    /// Apply a retry/backoff policy.
    pub fn with_retry(&self, policy: RetryPolicy) -> Result<Self, ModelError> {
        self.chain(Binding::Retry(policy))
    }

    /// Compose a fallback chain: alternates are tried in order once the
    /// active client fails.
    pub fn with_fallbacks(&self, alternates: Vec<Arc<dyn ChatModel>>) -> Self {
        self.rewrap(Arc::new(FallbackModel::new(self.active.clone(), alternates)))
    }

    fn chain(&self, binding: Binding) -> Result<Self, ModelError> {
        Ok(self.rewrap(self.active.rebind(binding)?))
    }

    /// Every rewrap preserves the base client and model name.
    fn rewrap(&self, active: Arc<dyn ChatModel>) -> Self {
        Self {
            model_name: self.model_name.clone(),
            active,
            base: self.base.clone(),
        }
    }

    async fn intercept(
        &self,
        operation: &str,
        user_query: String,
        cause: ModelError,
    ) -> InvocationError {
        raise(
            self.base.as_ref(),
            &self.model_name,
            operation,
            user_query,
            cause,
        )
        .await
    }
}

/// Token stream whose failures have already been normalized into
/// [`InvocationError`].
pub struct SafeTokenStream {
    receiver: mpsc::Receiver<Result<String, InvocationError>>,
}

impl SafeTokenStream {
    pub fn new(receiver: mpsc::Receiver<Result<String, InvocationError>>) -> Self {
        Self { receiver }
    }

    pub async fn recv(&mut self) -> Option<Result<String, InvocationError>> {
        self.receiver.recv().await
    }
}

fn query_of(messages: &[Message]) -> String {
    latest_user_query(messages)
        .unwrap_or(UNKNOWN_USER_QUERY)
        .to_string()
}

/// Classify, generate the friendly message, and build the structured error.
/// This always produces an error — it never recovers the call.
async fn raise(
    base: &dyn ChatModel,
    model_name: &str,
    operation: &str,
    user_query: String,
    cause: ModelError,
) -> InvocationError {
    error!(operation, model = model_name, "invocation failed: {cause}");
    let kind = error::classify(&cause);
    let raw_message = cause.to_string();
    let user_message = friendly::generate(base, kind, &raw_message).await;
    InvocationError {
        kind,
        raw_message,
        status_code: cause.status_code(),
        user_message,
        user_query,
        model_name: model_name.to_string(),
    }
}
