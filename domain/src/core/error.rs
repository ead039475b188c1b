//! Error classification vocabulary.
//!
//! Every upstream invocation failure is collapsed into one of these kinds at
//! the proxy boundary. The kind is diagnostic data: it is logged and carried
//! alongside the raw message, but never shown to the user.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of an invocation-time failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network failures, rate limits, provider outages.
    UpstreamTransport,
    /// Safety / content-filter rejections.
    ContentPolicy,
    /// Malformed or empty completions.
    GenerationFailure,
    /// Frame or payload encoding failures.
    Serialization,
    /// The completion handshake deadline elapsed.
    CompletionTimeout,
}

impl ErrorKind {
    /// Classify an upstream-provided HTTP status code.
    ///
    /// Content-policy rejections are usually signalled by a provider error
    /// code rather than the status alone, so adapters map those explicitly;
    /// this covers the remaining cases.
    pub fn from_status(status: u16) -> Self {
        match status {
            451 => ErrorKind::ContentPolicy,
            400 | 404 | 422 => ErrorKind::GenerationFailure,
            _ => ErrorKind::UpstreamTransport,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UpstreamTransport => "upstream_transport",
            ErrorKind::ContentPolicy => "content_policy",
            ErrorKind::GenerationFailure => "generation_failure",
            ErrorKind::Serialization => "serialization",
            ErrorKind::CompletionTimeout => "completion_timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
