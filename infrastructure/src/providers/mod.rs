//! Provider adapters implementing the [`ChatModel`] port.
//!
//! [`ChatModel`]: counsel_application::ports::chat_model::ChatModel

pub mod azure;
