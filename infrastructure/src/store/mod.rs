//! Conversation store adapters.

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlConversationStore;
pub use memory::InMemoryConversationStore;
