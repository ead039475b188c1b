//! Azure OpenAI provider adapter.
//!
//! Speaks the chat-completions REST protocol against an Azure OpenAI
//! deployment, both single-shot and streamed (SSE).

pub mod client;
pub mod sse;
pub mod types;

pub use client::AzureChatClient;
