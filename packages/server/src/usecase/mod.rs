//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作します。

pub mod ai_reply;
pub mod error;
pub mod list_messages;
pub mod message_relay;
pub mod record_heartbeat;

pub use ai_reply::{AI_AUTHOR, AiReplyUseCase};
pub use error::{AiReplyError, HeartbeatError, QueryError, RelayError};
pub use list_messages::{ListMessagesUseCase, ListUsersUseCase};
pub use message_relay::{MessageRelay, PostMessage};
pub use record_heartbeat::RecordHeartbeatUseCase;
