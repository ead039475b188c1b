//! Application layer for counsel
//!
//! This crate contains use cases, port definitions, the resilient
//! invocation proxy, and the completion handshake. It depends only on the
//! domain layer.

pub mod completion;
pub mod ports;
pub mod safe_model;
pub mod use_cases;

// Re-export commonly used types
pub use completion::{COMPLETION_TIMEOUT, CompletionHandle, CompletionWaiter};
pub use ports::{
    chat_model::{
        Binding, ChatModel, GenerationOptions, ModelError, RetryPolicy, TokenStream,
    },
    conversation_store::{ConversationStore, NoConversationStore, StoreError},
};
pub use safe_model::{
    FallbackModel, InvocationError, SafeChatModel, SafeTokenStream,
    friendly::FALLBACK_MESSAGE,
};
pub use use_cases::{
    persist_turn::{PersistTurnUseCase, TurnRequest},
    recent_history::RecentHistoryUseCase,
    stream_chat::StreamChatUseCase,
};
