//! Route table.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::{handler, state::AppState};

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handler::health_check))
        .route("/api/messages", get(handler::list_messages))
        .route("/api/messages/send", post(handler::send_message))
        .route("/api/messages/delete", post(handler::delete_message))
        .route("/api/messages/react", post(handler::react_message))
        .route("/api/messages/ai-respond", post(handler::ai_respond))
        .route("/api/heartbeat", post(handler::heartbeat))
        .route("/api/online-users", get(handler::online_users))
        .route("/api/online-count", get(handler::online_count))
        .route("/api/users", get(handler::list_users))
        .route("/ws", get(handler::websocket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
