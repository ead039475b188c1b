//! Recent-history replay.
//!
//! Loads the latest turns for a (user, room) and reassembles them,
//! oldest first, into alternating user/assistant messages suitable for
//! prepending to a new request. A store failure degrades to an empty
//! history — a chat without context beats a failed chat.

use crate::ports::conversation_store::ConversationStore;
use counsel_domain::Message;
use std::sync::Arc;
use tracing::warn;

pub struct RecentHistoryUseCase {
    store: Arc<dyn ConversationStore>,
}

impl RecentHistoryUseCase {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// The latest `max_turns` turns as oldest-first alternating messages.
    pub async fn execute(&self, user_id: &str, room_id: &str, max_turns: usize) -> Vec<Message> {
        let summaries = match self.store.recent_turns(user_id, room_id, max_turns).await {
            Ok(summaries) => summaries,
            Err(e) => {
                warn!(user_id, room_id, "recent conversation load failed: {e}");
                return Vec::new();
            }
        };

        let mut messages = Vec::with_capacity(summaries.len() * 2);
        // The store returns newest first; replay oldest first.
        for summary in summaries.into_iter().rev() {
            if !summary.user_query.is_empty() {
                messages.push(Message::user(summary.user_query));
            }
            if !summary.output.is_empty() {
                messages.push(Message::assistant(summary.output));
            }
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::conversation_store::StoreError;
    use async_trait::async_trait;
    use counsel_domain::{ConversationTurn, Role, TurnSummary};

    struct FixedStore {
        summaries: Option<Vec<TurnSummary>>,
    }

    #[async_trait]
    impl ConversationStore for FixedStore {
        async fn save(&self, _turn: &ConversationTurn) -> Result<(), StoreError> {
            Ok(())
        }

        async fn recent_turns(
            &self,
            _user_id: &str,
            _room_id: &str,
            limit: usize,
        ) -> Result<Vec<TurnSummary>, StoreError> {
            match &self.summaries {
                Some(summaries) => Ok(summaries.iter().take(limit).cloned().collect()),
                None => Err(StoreError::Unavailable("store down".to_string())),
            }
        }
    }

    fn summary(user_query: &str, output: &str) -> TurnSummary {
        TurnSummary {
            user_query: user_query.to_string(),
            output: output.to_string(),
        }
    }

    #[tokio::test]
    async fn newest_first_input_becomes_oldest_first_alternation() {
        let store = Arc::new(FixedStore {
            summaries: Some(vec![
                summary("second question", "second answer"),
                summary("first question", "first answer"),
            ]),
        });
        let messages = RecentHistoryUseCase::new(store)
            .execute("user-7", "room-3", 10)
            .await;

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "first question");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "first answer");
        assert_eq!(messages[2].content, "second question");
        assert_eq!(messages[3].content, "second answer");
    }

    #[tokio::test]
    async fn empty_fields_are_skipped() {
        let store = Arc::new(FixedStore {
            summaries: Some(vec![summary("question", "")]),
        });
        let messages = RecentHistoryUseCase::new(store)
            .execute("user-7", "room-3", 10)
            .await;

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
    }

    #[tokio::test]
    async fn store_failure_degrades_to_empty_history() {
        let store = Arc::new(FixedStore { summaries: None });
        let messages = RecentHistoryUseCase::new(store)
            .execute("user-7", "room-3", 10)
            .await;
        assert!(messages.is_empty());
    }
}
