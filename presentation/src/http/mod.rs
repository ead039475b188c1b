//! HTTP routing, request payloads, and the SSE chat handler.

pub mod chat;
pub mod health;
pub mod request;
pub mod routes;
