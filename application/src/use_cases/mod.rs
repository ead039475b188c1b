//! Use cases: the streaming emitter, the deferred-persistence handshake,
//! and recent-history replay.

pub mod persist_turn;
pub mod recent_history;
pub mod stream_chat;
