//! Realtime presence and message fan-out for the Agora chatroom.
//!
//! The server keeps track of who is online and who is typing, and relays
//! chat messages, deletions and reactions to every connected client over
//! WebSocket. Clients without a WebSocket can poll the HTTP API instead.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::ServerConfig;
pub use ui::run as run_server;
