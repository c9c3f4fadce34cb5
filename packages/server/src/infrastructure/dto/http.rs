//! HTTP API request/response DTOs for the chat application.
//!
//! Field names are camelCase to match the browser client.

use serde::{Deserialize, Serialize};

use super::websocket::{MessageDto, ReactionGroupDto};

/// Query for `GET /api/messages`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesQuery {
    /// Only return messages created after this Unix timestamp (milliseconds)
    pub since: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<MessageDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub username: String,
    pub text: String,
    pub link_to_message: Option<i64>,
    pub profile_picture_url: Option<String>,
}

/// Response carrying one message (send, ai-respond)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: MessageDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageIdRequest {
    pub message_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteMessageResponse {
    pub success: bool,
    /// Removed ids, target first then cascaded replies
    pub deleted: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactRequest {
    pub message_id: i64,
    pub username: String,
    pub reaction_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactResponse {
    pub success: bool,
    pub reactions: Vec<ReactionGroupDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUsersResponse {
    pub online_users: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineCountResponse {
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<UserDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub username: String,
    pub last_online_time: Option<String>, // RFC 3339
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
