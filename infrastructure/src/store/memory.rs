//! In-memory conversation store.
//!
//! Used when no persistence path is configured, and by tests that need to
//! observe what was saved.

use async_trait::async_trait;
use counsel_application::ports::conversation_store::{ConversationStore, StoreError};
use counsel_domain::{ConversationTurn, TurnSummary};
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryConversationStore {
    turns: Mutex<Vec<ConversationTurn>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything saved so far (test observation point).
    pub fn saved_turns(&self) -> Vec<ConversationTurn> {
        self.turns.lock().expect("store lock poisoned").clone()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn save(&self, turn: &ConversationTurn) -> Result<(), StoreError> {
        self.turns
            .lock()
            .expect("store lock poisoned")
            .push(turn.clone());
        Ok(())
    }

    async fn recent_turns(
        &self,
        user_id: &str,
        room_id: &str,
        limit: usize,
    ) -> Result<Vec<TurnSummary>, StoreError> {
        let turns = self.turns.lock().expect("store lock poisoned");
        Ok(turns
            .iter()
            .filter(|t| t.identifiers.user_id == user_id && t.identifiers.room_id == room_id)
            .rev()
            .take(limit)
            .map(|t| TurnSummary {
                user_query: t.runtime_info.user_query.clone(),
                output: t.runtime_info.output.clone(),
            })
            .collect())
    }
}
