//! Persisted conversation turn documents.
//!
//! A turn is one user question plus the assistant's finished response. The
//! document layout mirrors what the store indexes: the id at the top level,
//! identifiers for routing, runtime info for replay, and the user id as the
//! partition key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifiers locating a turn. The partition key is the user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnIdentifiers {
    pub user_id: String,
    pub chat_id: String,
    pub room_id: String,
}

/// Execution metadata captured alongside the exchanged text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeInfo {
    /// The question that produced this turn.
    pub user_query: String,
    /// The assistant's full accumulated response.
    pub output: String,
    /// Model that served the request.
    pub model: String,
    /// Wall-clock time from request start to the terminal frame.
    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}

/// The persisted unit of one chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: String,
    pub identifiers: TurnIdentifiers,
    pub runtime_info: RuntimeInfo,
}

impl ConversationTurn {
    /// Build a turn with a fresh id.
    pub fn new(identifiers: TurnIdentifiers, runtime_info: RuntimeInfo) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            identifiers,
            runtime_info,
        }
    }

    /// Partition value used by the store.
    pub fn partition_key(&self) -> &str {
        &self.identifiers.user_id
    }
}

/// Projection returned by recent-turn queries: just the replayable pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnSummary {
    pub user_query: String,
    pub output: String,
}
