//! インメモリ Repository 実装

pub mod message_log;
pub mod user_directory;

pub use message_log::InMemoryMessageLog;
pub use user_directory::InMemoryUserDirectory;
