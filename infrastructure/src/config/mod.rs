//! Configuration loading and validation.

pub mod file_config;
pub mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileHistoryConfig, FileLoggingConfig, FileModelConfig,
    FilePersistenceConfig, FileServerConfig,
};
pub use loader::ConfigLoader;
