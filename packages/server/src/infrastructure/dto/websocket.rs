//! WebSocket message DTOs for the chat application.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`; event
//! names are the kebab-case strings the browser client listens for.

use serde::{Deserialize, Serialize};

use crate::{
    domain::{Message, RealtimeEvent, ReactionGroup, Username, ValueObjectError},
    infrastructure::realtime::InboundEvent,
};

/// Event pushed from the server to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    OnlineUsers(Vec<String>),
    TypingUsers(Vec<String>),
    NewMessage(MessageDto),
    DeleteMessage(i64),
    MessageReaction(MessageReactionDto),
}

/// Event sent by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    UserOnline(String),
    UserTyping(String),
    UserStoppedTyping,
    Heartbeat,
}

/// Message as seen by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: i64,
    pub username: String,
    pub text: String,
    /// Unix timestamp (milliseconds since epoch, UTC)
    pub timestamp: i64,
    pub profile_picture_url: Option<String>,
    /// Id of the message this one replies to
    pub link_to_message: Option<i64>,
    #[serde(default)]
    pub reactions: Vec<ReactionGroupDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionGroupDto {
    #[serde(rename = "type")]
    pub reaction_type: String,
    pub users: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReactionDto {
    pub message_id: i64,
    pub reactions: Vec<ReactionGroupDto>,
}

fn usernames(users: &[Username]) -> Vec<String> {
    users.iter().map(|u| u.as_str().to_string()).collect()
}

impl From<&ReactionGroup> for ReactionGroupDto {
    fn from(group: &ReactionGroup) -> Self {
        Self {
            reaction_type: group.reaction_type.as_str().to_string(),
            users: usernames(&group.users),
        }
    }
}

impl ReactionGroupDto {
    pub fn from_groups(groups: &[ReactionGroup]) -> Vec<Self> {
        groups.iter().map(Self::from).collect()
    }
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.value(),
            username: message.author.as_str().to_string(),
            text: message.text.as_str().to_string(),
            timestamp: message.created_at.value(),
            profile_picture_url: message.profile_picture_url.clone(),
            link_to_message: message.parent_id.map(|id| id.value()),
            reactions: ReactionGroupDto::from_groups(&message.reactions),
        }
    }
}

impl From<&RealtimeEvent> for ServerEvent {
    fn from(event: &RealtimeEvent) -> Self {
        match event {
            RealtimeEvent::OnlineUsers(users) => ServerEvent::OnlineUsers(usernames(users)),
            RealtimeEvent::TypingUsers(users) => ServerEvent::TypingUsers(usernames(users)),
            RealtimeEvent::NewMessage(message) => ServerEvent::NewMessage(message.into()),
            RealtimeEvent::DeleteMessage(id) => ServerEvent::DeleteMessage(id.value()),
            RealtimeEvent::MessageReaction {
                message_id,
                reactions,
            } => ServerEvent::MessageReaction(MessageReactionDto {
                message_id: message_id.value(),
                reactions: ReactionGroupDto::from_groups(reactions),
            }),
        }
    }
}

impl TryFrom<ClientEvent> for InboundEvent {
    type Error = ValueObjectError;

    fn try_from(event: ClientEvent) -> Result<Self, Self::Error> {
        Ok(match event {
            ClientEvent::UserOnline(name) => InboundEvent::UserOnline(Username::try_from(name)?),
            ClientEvent::UserTyping(name) => InboundEvent::UserTyping(Username::try_from(name)?),
            ClientEvent::UserStoppedTyping => InboundEvent::UserStoppedTyping,
            ClientEvent::Heartbeat => InboundEvent::Heartbeat,
        })
    }
}

/// Serialize an outbound event into one text frame
pub fn encode_event(event: &RealtimeEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ServerEvent::from(event))
}
