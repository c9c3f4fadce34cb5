//! UseCase: AI による返信
//!
//! 対象メッセージと直近の会話を ReplyGenerator に渡し、生成された本文を
//! `claude` の返信として MessageRelay 経由で投稿します。返信は対象メッセージに
//! 紐づくため、対象が削除されると一緒に削除されます。

use std::sync::Arc;

use crate::domain::{Message, MessageId, MessageLog, ReplyGenerator};

use super::{
    error::AiReplyError,
    message_relay::{MessageRelay, PostMessage},
};

/// AI 返信の投稿者名
pub const AI_AUTHOR: &str = "claude";

/// AI 返信のユースケース
pub struct AiReplyUseCase {
    log: Arc<dyn MessageLog>,
    relay: Arc<MessageRelay>,
    /// 未設定の場合 AI 返信は無効
    generator: Option<Arc<dyn ReplyGenerator>>,
    /// 対象を探し、生成に渡す直近メッセージ数（ログの保持件数を渡す）
    history_limit: usize,
}

impl AiReplyUseCase {
    pub fn new(
        log: Arc<dyn MessageLog>,
        relay: Arc<MessageRelay>,
        generator: Option<Arc<dyn ReplyGenerator>>,
        history_limit: usize,
    ) -> Self {
        Self {
            log,
            relay,
            generator,
            history_limit,
        }
    }

    /// `message_id` への返信を生成して投稿
    ///
    /// # Returns
    ///
    /// * `Ok(Message)` - 投稿された返信
    /// * `Err(AiReplyError::NotConfigured)` - ReplyGenerator が設定されていない
    /// * `Err(AiReplyError::NotFound)` - 対象が直近のメッセージに存在しない
    /// * `Err(AiReplyError::Upstream)` - 生成に失敗
    pub async fn execute(&self, message_id: MessageId) -> Result<Message, AiReplyError> {
        let generator = self.generator.as_ref().ok_or(AiReplyError::NotConfigured)?;

        let history = self
            .log
            .list_recent(self.history_limit)
            .await
            .map_err(|e| AiReplyError::Relay(e.into()))?;
        let target = history
            .iter()
            .find(|m| m.id == message_id)
            .ok_or(AiReplyError::NotFound(message_id))?;

        let text = generator
            .generate(&history, target)
            .await
            .map_err(|e| AiReplyError::Upstream(e.0))?;
        tracing::debug!("Generated a reply to message {}", message_id);

        let reply = self
            .relay
            .post(PostMessage::new(AI_AUTHOR, text).reply_to(message_id))
            .await?;
        Ok(reply)
    }
}
