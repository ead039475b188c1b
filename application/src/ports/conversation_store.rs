//! Conversation store port
//!
//! Defines the narrow save/query contract the core depends on. The store
//! keys documents by the turn id and partitions them by the user id;
//! everything else about the storage engine is an infrastructure concern.

use async_trait::async_trait;
use counsel_domain::{ConversationTurn, TurnSummary};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Query failed: {0}")]
    Query(String),
}

/// Durable storage for finished conversation turns.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Persist one finished turn.
    async fn save(&self, turn: &ConversationTurn) -> Result<(), StoreError>;

    /// The most recent turns for a (user, room), newest first.
    async fn recent_turns(
        &self,
        user_id: &str,
        room_id: &str,
        limit: usize,
    ) -> Result<Vec<TurnSummary>, StoreError>;
}

/// No-op implementation for tests and when persistence is disabled.
pub struct NoConversationStore;

#[async_trait]
impl ConversationStore for NoConversationStore {
    async fn save(&self, _turn: &ConversationTurn) -> Result<(), StoreError> {
        Ok(())
    }

    async fn recent_turns(
        &self,
        _user_id: &str,
        _room_id: &str,
        _limit: usize,
    ) -> Result<Vec<TurnSummary>, StoreError> {
        Ok(Vec::new())
    }
}
