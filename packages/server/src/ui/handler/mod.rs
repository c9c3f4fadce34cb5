//! Handler modules for HTTP and WebSocket endpoints.

pub mod http;
pub mod websocket;

// Re-export HTTP handlers
pub use http::{
    ai_respond, delete_message, health_check, heartbeat, list_messages, list_users, online_count,
    online_users, react_message, send_message,
};

// Re-export WebSocket handlers
pub use websocket::websocket_handler;
