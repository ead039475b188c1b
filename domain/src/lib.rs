//! Domain layer for counsel
//!
//! This crate contains the core entities of the chat backend: conversation
//! messages, the streaming frame vocabulary, the accumulated stream outcome,
//! and the persisted conversation turn. It has no dependencies on
//! infrastructure or presentation concerns.

pub mod core;
pub mod session;
pub mod turn;

// Re-export commonly used types
pub use self::core::error::ErrorKind;
pub use session::{
    frame::{FinishMetadata, StreamFrame},
    message::{Message, Role, UnknownRole, latest_user_query},
    outcome::{StreamOutcome, Termination},
};
pub use turn::{ConversationTurn, RuntimeInfo, TurnIdentifiers, TurnSummary};
