//! Chat request payloads.
//!
//! The edge sends the chat id plus the latest message only; history is
//! replayed server-side. `userId`/`roomId` are optional — absent values
//! fall back to `"anonymous"` and the chat id.

use counsel_domain::TurnIdentifiers;
use serde::Deserialize;

/// Default user identifier when the edge sends none.
pub const ANONYMOUS_USER: &str = "anonymous";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub chat_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
    pub message: MessagePayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagePayload {
    pub role: String,
    pub content: String,
}

impl ChatRequest {
    /// Turn identifiers with the documented defaults for absent fields.
    pub fn identifiers(&self) -> TurnIdentifiers {
        TurnIdentifiers {
            user_id: self
                .user_id
                .clone()
                .unwrap_or_else(|| ANONYMOUS_USER.to_string()),
            chat_id: self.chat_id.clone(),
            room_id: self.room_id.clone().unwrap_or_else(|| self.chat_id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_minimal_payload() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"chatId": "chat-1", "message": {"role": "user", "content": "안녕"}}"#,
        )
        .unwrap();
        assert_eq!(request.chat_id, "chat-1");
        assert_eq!(request.message.role, "user");
        assert_eq!(request.message.content, "안녕");

        let ids = request.identifiers();
        assert_eq!(ids.user_id, ANONYMOUS_USER);
        assert_eq!(ids.room_id, "chat-1");
    }

    #[test]
    fn explicit_identifiers_are_honored() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"chatId": "chat-1", "userId": "user-7", "roomId": "room-3",
                "message": {"role": "user", "content": "안녕"}}"#,
        )
        .unwrap();
        let ids = request.identifiers();
        assert_eq!(ids.user_id, "user-7");
        assert_eq!(ids.chat_id, "chat-1");
        assert_eq!(ids.room_id, "room-3");
    }

    #[test]
    fn missing_message_is_rejected() {
        let result = serde_json::from_str::<ChatRequest>(r#"{"chatId": "chat-1"}"#);
        assert!(result.is_err());
    }
}
