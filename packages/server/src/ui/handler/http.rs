//! HTTP API endpoint handlers.

use std::sync::Arc;

use agora_shared::time::millis_to_rfc3339;
use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
};

use crate::{
    domain::{MessageId, Timestamp},
    infrastructure::dto::{
        http::{
            DeleteMessageResponse, HeartbeatRequest, MessageIdRequest, MessageResponse,
            MessagesQuery, MessagesResponse, OnlineCountResponse, OnlineUsersResponse,
            ReactRequest, ReactResponse, SendMessageRequest, SuccessResponse, UserDto,
            UsersResponse,
        },
        websocket::{MessageDto, ReactionGroupDto},
    },
    ui::{error::ApiError, state::AppState},
    usecase::{
        AiReplyUseCase, ListMessagesUseCase, ListUsersUseCase,
        PostMessage, RecordHeartbeatUseCase,
    },
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Message history, oldest first
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let usecase = ListMessagesUseCase::new(state.message_log.clone(), state.recent_limit);
    let messages = usecase.execute(query.since.map(Timestamp::new)).await?;

    Ok(Json(MessagesResponse {
        messages: messages.iter().map(MessageDto::from).collect(),
    }))
}

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;

    let mut post = PostMessage::new(request.username, request.text);
    if let Some(parent_id) = request.link_to_message {
        post = post.reply_to(MessageId::new(parent_id));
    }
    if let Some(url) = request.profile_picture_url {
        post = post.with_profile_picture(url);
    }
    let message = state.relay.post(post).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: MessageDto::from(&message),
    }))
}

/// Delete a message together with its replies
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MessageIdRequest>, JsonRejection>,
) -> Result<Json<DeleteMessageResponse>, ApiError> {
    let Json(request) = payload?;
    let removed = state.relay.remove(MessageId::new(request.message_id)).await?;

    Ok(Json(DeleteMessageResponse {
        success: true,
        deleted: removed.iter().map(MessageId::value).collect(),
    }))
}

/// Toggle a reaction
pub async fn react_message(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReactRequest>, JsonRejection>,
) -> Result<Json<ReactResponse>, ApiError> {
    let Json(request) = payload?;
    let reactions = state
        .relay
        .react(
            MessageId::new(request.message_id),
            &request.username,
            &request.reaction_type,
        )
        .await?;

    Ok(Json(ReactResponse {
        success: true,
        reactions: ReactionGroupDto::from_groups(&reactions),
    }))
}

/// Ask the reply generator to answer a message
pub async fn ai_respond(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MessageIdRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    let usecase = AiReplyUseCase::new(
        state.message_log.clone(),
        state.relay.clone(),
        state.reply_generator.clone(),
        state.recent_limit,
    );
    let reply = usecase.execute(MessageId::new(request.message_id)).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: MessageDto::from(&reply),
    }))
}

/// Presence heartbeat for clients without a WebSocket
pub async fn heartbeat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<HeartbeatRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(request) = payload?;
    let usecase = RecordHeartbeatUseCase::new(
        state.directory.clone(),
        state.hub.clone(),
        state.clock.clone(),
    );
    usecase.execute(&request.username).await?;

    Ok(Json(SuccessResponse { success: true }))
}

pub async fn online_users(State(state): State<Arc<AppState>>) -> Json<OnlineUsersResponse> {
    let users = state.hub.online_users().await;
    Json(OnlineUsersResponse {
        online_users: users.into_iter().map(|u| u.into_string()).collect(),
    })
}

pub async fn online_count(State(state): State<Arc<AppState>>) -> Json<OnlineCountResponse> {
    let count = state.hub.online_users().await.len();
    Json(OnlineCountResponse { count })
}

/// Every known user with their last online time
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsersResponse>, ApiError> {
    let users = ListUsersUseCase::new(state.directory.clone()).execute().await?;

    Ok(Json(UsersResponse {
        users: users
            .into_iter()
            .map(|user| UserDto {
                last_online_time: user
                    .last_online_at
                    .and_then(|at| millis_to_rfc3339(at.value())),
                username: user.username.into_string(),
            })
            .collect(),
    }))
}
