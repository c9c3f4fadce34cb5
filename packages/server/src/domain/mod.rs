//! Domain layer for the chat application.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod presence;
pub mod repository;
pub mod service;
pub mod typing;
pub mod value_object;

pub use entity::{DEFAULT_MESSAGE_RETENTION, Message, NewMessage, ReactionGroup, UserSummary};
pub use error::{RepositoryError, ValueObjectError};
pub use event::{EventBroadcaster, RealtimeEvent};
pub use factory::ConnectionIdFactory;
pub use presence::{PresenceRecord, PresenceStore, PresenceTracker};
pub use repository::{MessageLog, UserDirectory};
pub use service::{ReplyError, ReplyGenerator};
pub use typing::TypingTracker;
pub use value_object::{ConnectionId, MessageId, MessageText, ReactionType, Timestamp, Username};
