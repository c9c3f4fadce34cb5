//! Realtime events fanned out to connected clients.

use async_trait::async_trait;

use super::{
    entity::{Message, ReactionGroup},
    value_object::{MessageId, Username},
};

/// Outbound realtime event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeEvent {
    /// Current online users (complete list)
    OnlineUsers(Vec<Username>),
    /// Current typing users (complete list)
    TypingUsers(Vec<Username>),
    NewMessage(Message),
    DeleteMessage(MessageId),
    /// Complete reaction list of one message, never a diff
    MessageReaction {
        message_id: MessageId,
        reactions: Vec<ReactionGroup>,
    },
}

impl RealtimeEvent {
    /// Wire event name
    pub fn name(&self) -> &'static str {
        match self {
            RealtimeEvent::OnlineUsers(_) => "online-users",
            RealtimeEvent::TypingUsers(_) => "typing-users",
            RealtimeEvent::NewMessage(_) => "new-message",
            RealtimeEvent::DeleteMessage(_) => "delete-message",
            RealtimeEvent::MessageReaction { .. } => "message-reaction",
        }
    }
}

/// Fan-out seam used by the message relay.
///
/// Delivery problems stay inside the implementation: a broadcast never fails
/// from the caller's point of view.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventBroadcaster: Send + Sync {
    async fn broadcast(&self, event: RealtimeEvent);
}
