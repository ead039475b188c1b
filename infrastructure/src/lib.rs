//! Infrastructure layer for counsel
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer, plus configuration file loading.

pub mod config;
pub mod providers;
pub mod store;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileHistoryConfig, FileLoggingConfig,
    FileModelConfig, FilePersistenceConfig, FileServerConfig,
};
pub use providers::azure::AzureChatClient;
pub use store::{InMemoryConversationStore, JsonlConversationStore};
