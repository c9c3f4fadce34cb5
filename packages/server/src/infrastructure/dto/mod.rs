//! Data Transfer Objects for HTTP and WebSocket payloads.

pub mod http;
pub mod websocket;
