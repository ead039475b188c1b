//! The structured error raised at the proxy boundary.

use crate::ports::chat_model::ModelError;
use counsel_domain::ErrorKind;
use thiserror::Error;

/// The single error every wrapped invocation failure collapses into.
///
/// `Display` renders only the user-presentable message — that is what ends
/// up in a terminal `error` frame. The raw diagnostic context stays in the
/// fields for logging.
#[derive(Error, Debug, Clone)]
#[error("{user_message}")]
pub struct InvocationError {
    pub kind: ErrorKind,
    /// Original diagnostic text from the underlying client.
    pub raw_message: String,
    /// Upstream-provided HTTP status, when one exists.
    pub status_code: Option<u16>,
    /// Safe, non-technical sentence shown to the user. Never empty.
    pub user_message: String,
    /// Best-effort text of the triggering question, or a fixed placeholder.
    pub user_query: String,
    pub model_name: String,
}

/// Map a port-level failure onto the classification vocabulary.
pub fn classify(error: &ModelError) -> ErrorKind {
    match error {
        ModelError::ContentFiltered(_) => ErrorKind::ContentPolicy,
        ModelError::EmptyCompletion | ModelError::MalformedCompletion(_) => {
            ErrorKind::GenerationFailure
        }
        ModelError::Serialization(_) => ErrorKind::Serialization,
        ModelError::Transport {
            status: Some(code), ..
        } => ErrorKind::from_status(*code),
        ModelError::RateLimited { .. }
        | ModelError::Timeout
        | ModelError::Closed
        | ModelError::Transport { .. }
        | ModelError::UnsupportedBinding(_) => ErrorKind::UpstreamTransport,
    }
}
