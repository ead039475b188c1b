//! Streaming output frames.
//!
//! [`StreamFrame`] is one discrete server-sent event in the chat response
//! stream. Frames for a single stream form the regular sequence
//! `start, text-start, (text-delta)*, text-end, finish`, or the same prefix
//! terminated by a single `error` frame. A terminal frame is never followed
//! by another frame.

use serde::{Deserialize, Serialize};

/// Finish reason reported on a successfully completed stream.
pub const FINISH_REASON_STOP: &str = "stop";

/// One event in the chat response stream, in wire representation.
///
/// The `messageId` carried by `start` (and the `id` of the text frames) is
/// stable for the whole stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamFrame {
    #[serde(rename = "start")]
    Start {
        #[serde(rename = "messageId")]
        message_id: String,
    },

    #[serde(rename = "text-start")]
    TextStart { id: String },

    #[serde(rename = "text-delta")]
    TextDelta { id: String, delta: String },

    #[serde(rename = "text-end")]
    TextEnd { id: String },

    #[serde(rename = "finish")]
    Finish {
        #[serde(rename = "messageMetadata")]
        metadata: FinishMetadata,
    },

    #[serde(rename = "error")]
    Error {
        #[serde(rename = "errorText")]
        error_text: String,
    },
}

/// Metadata attached to the `finish` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishMetadata {
    #[serde(rename = "finishReason")]
    pub finish_reason: String,
}

impl StreamFrame {
    pub fn start(message_id: impl Into<String>) -> Self {
        StreamFrame::Start {
            message_id: message_id.into(),
        }
    }

    pub fn text_start(id: impl Into<String>) -> Self {
        StreamFrame::TextStart { id: id.into() }
    }

    pub fn delta(id: impl Into<String>, delta: impl Into<String>) -> Self {
        StreamFrame::TextDelta {
            id: id.into(),
            delta: delta.into(),
        }
    }

    pub fn text_end(id: impl Into<String>) -> Self {
        StreamFrame::TextEnd { id: id.into() }
    }

    pub fn finish() -> Self {
        StreamFrame::Finish {
            metadata: FinishMetadata {
                finish_reason: FINISH_REASON_STOP.to_string(),
            },
        }
    }

    pub fn error(error_text: impl Into<String>) -> Self {
        StreamFrame::Error {
            error_text: error_text.into(),
        }
    }

    /// Returns true if this frame terminates the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamFrame::Finish { .. } | StreamFrame::Error { .. })
    }
}
