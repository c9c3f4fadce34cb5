//! Shared application state.

use std::sync::Arc;

use agora_shared::time::Clock;
use serde::Deserialize;

use crate::{
    config::ServerConfig,
    domain::{EventBroadcaster, MessageLog, ReplyGenerator, UserDirectory},
    infrastructure::{
        realtime::BroadcastHub,
        repository::{InMemoryMessageLog, InMemoryUserDirectory},
    },
    usecase::MessageRelay,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    /// Bind the connection to this user right away (same as a `user-online` event)
    pub username: Option<String>,
}

/// Shared application state
pub struct AppState {
    /// Connection registry and fan-out (one per process)
    pub hub: Arc<BroadcastHub>,
    /// Message lifecycle, serialized per message id
    pub relay: Arc<MessageRelay>,
    /// Repository（データアクセス層の抽象化）
    pub message_log: Arc<dyn MessageLog>,
    pub directory: Arc<dyn UserDirectory>,
    /// None disables `/api/messages/ai-respond`
    pub reply_generator: Option<Arc<dyn ReplyGenerator>>,
    pub clock: Arc<dyn Clock>,
    /// Per-connection send queue capacity
    pub send_buffer: usize,
    /// Messages returned by a history query without `since`
    pub recent_limit: usize,
}

impl AppState {
    /// State backed by the in-memory message log and user directory
    pub fn in_memory(config: &ServerConfig, clock: Arc<dyn Clock>) -> Self {
        let hub = Arc::new(BroadcastHub::new(config.online_threshold(), clock.clone()));
        let message_log: Arc<dyn MessageLog> = Arc::new(InMemoryMessageLog::new(
            config.message_retention(),
            clock.clone(),
        ));
        let broadcaster: Arc<dyn EventBroadcaster> = hub.clone();
        let relay = Arc::new(MessageRelay::new(message_log.clone(), broadcaster));

        Self {
            hub,
            relay,
            message_log,
            directory: Arc::new(InMemoryUserDirectory::new()),
            reply_generator: None,
            clock,
            send_buffer: config.send_buffer(),
            recent_limit: config.message_retention(),
        }
    }

    /// Enable AI replies
    pub fn with_reply_generator(mut self, generator: Arc<dyn ReplyGenerator>) -> Self {
        self.reply_generator = Some(generator);
        self
    }
}
