//! Presentation layer for counsel
//!
//! The HTTP surface: one POST chat endpoint streaming server-sent events,
//! plus a health endpoint.

pub mod http;

// Re-export commonly used types
pub use http::{
    request::{ChatRequest, MessagePayload},
    routes::{AppState, build_router},
};
