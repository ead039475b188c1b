//! Router assembly and shared application state.
//!
//! `AppState` is the explicit application context: constructed once at
//! startup and injected into handlers, so initialization ordering and
//! failures are visible at the call site instead of at first access.

use super::{chat, health};
use axum::{
    Router,
    routing::{get, post},
};
use counsel_application::{PersistTurnUseCase, RecentHistoryUseCase, StreamChatUseCase};
use std::sync::Arc;

pub struct AppState {
    pub stream_chat: StreamChatUseCase,
    pub persist_turn: PersistTurnUseCase,
    pub recent_history: RecentHistoryUseCase,
    /// Turns replayed into a new request.
    pub history_turns: usize,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/chat", post(chat::chat_handler))
        .route("/api/health", get(health::health_handler))
        .with_state(state)
}
