//! Wire payloads for the Azure OpenAI chat-completions protocol.

use counsel_domain::{Message, Role};
use serde::{Deserialize, Serialize};

/// Request body for both single-shot and streamed calls.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct WireMessage {
    pub role: &'static str,
    pub content: String,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: role_str(message.role),
            content: message.content.clone(),
        }
    }
}

pub fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// Single-shot response body.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// One streamed SSE chunk.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

/// Error body shape shared by Azure OpenAI and OpenAI-compatible servers.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_omits_unset_fields() {
        let request = ChatCompletionRequest {
            messages: vec![WireMessage::from(&Message::user("안녕"))],
            temperature: None,
            max_completion_tokens: None,
            reasoning_effort: Some("minimal".to_string()),
            tools: None,
            response_format: None,
            stream: true,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "messages": [{"role": "user", "content": "안녕"}],
                "reasoning_effort": "minimal",
                "stream": true,
            })
        );
    }

    #[test]
    fn non_streaming_request_omits_the_stream_flag() {
        let request = ChatCompletionRequest {
            messages: vec![],
            temperature: None,
            max_completion_tokens: None,
            reasoning_effort: None,
            tools: None,
            response_format: None,
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("stream").is_none());
    }

    #[test]
    fn chunk_parses_with_missing_delta_content() {
        let chunk: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#).unwrap();
        assert!(chunk.choices[0].delta.content.is_none());

        let chunk: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":"안"}}]}"#).unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("안"));
    }

    #[test]
    fn error_body_parses_code_and_message() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"error":{"code":"content_filter","message":"filtered","param":null}}"#,
        )
        .unwrap();
        assert_eq!(body.error.code.as_deref(), Some("content_filter"));
        assert_eq!(body.error.message, "filtered");
    }
}
