//! Conversation message entities.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Error returned when a wire role string is not recognized.
#[derive(Debug, Error)]
#[error("unknown message role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// A role-tagged message handed to the model client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Scan a message sequence from the end for the most recent user-authored
/// entry.
///
/// Used for diagnostics when an invocation fails: the text of the triggering
/// question is attached to the structured error.
pub fn latest_user_query(messages: &[Message]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_wire_strings() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert_eq!("system".parse::<Role>().unwrap(), Role::System);
        assert!("tool".parse::<Role>().is_err());
    }

    #[test]
    fn latest_user_query_scans_from_the_end() {
        let messages = vec![
            Message::system("persona"),
            Message::user("first question"),
            Message::assistant("first answer"),
            Message::user("second question"),
        ];
        assert_eq!(latest_user_query(&messages), Some("second question"));
    }

    #[test]
    fn latest_user_query_none_without_user_entry() {
        let messages = vec![Message::system("persona"), Message::assistant("hello")];
        assert_eq!(latest_user_query(&messages), None);
        assert_eq!(latest_user_query(&[]), None);
    }

    #[test]
    fn message_serde_uses_lowercase_roles() {
        let json = serde_json::to_value(Message::user("안녕")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "안녕"}));
    }
}
