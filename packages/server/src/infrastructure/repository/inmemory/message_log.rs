//! InMemory MessageLog 実装
//!
//! ドメイン層が定義する MessageLog trait の具体的な実装。
//! Vec をインメモリ DB として使用し、保持件数（retention）を超えた古い
//! メッセージはリアクションごと削除します。
//!
//! プロセス再起動で内容は失われます。永続化が必要な場合は同じ trait を
//! DB に対して実装してください。

use std::sync::Arc;

use agora_shared::time::Clock;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Message, MessageId, MessageLog, NewMessage, ReactionGroup, ReactionType, RepositoryError,
    Timestamp, Username,
};

/// 1 件のリアクション（message, user, type の組は一意）
#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredReaction {
    message_id: MessageId,
    username: Username,
    reaction_type: ReactionType,
}

#[derive(Debug, Default)]
struct LogState {
    /// 作成順（= id 順）
    messages: Vec<Message>,
    /// 追加順
    reactions: Vec<StoredReaction>,
    last_id: i64,
}

impl LogState {
    fn reactions_for(&self, id: MessageId) -> Vec<ReactionGroup> {
        ReactionGroup::group(
            self.reactions
                .iter()
                .filter(|r| r.message_id == id)
                .map(|r| (&r.reaction_type, &r.username)),
        )
    }

    fn with_reactions(&self, message: &Message) -> Message {
        let mut message = message.clone();
        message.reactions = self.reactions_for(message.id);
        message
    }

    fn remove(&mut self, id: MessageId) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != id);
        self.reactions.retain(|r| r.message_id != id);
        self.messages.len() != before
    }

    fn prune(&mut self, retention: usize) {
        while self.messages.len() > retention {
            let oldest = self.messages[0].id;
            self.remove(oldest);
        }
    }
}

/// インメモリ MessageLog 実装
pub struct InMemoryMessageLog {
    state: Mutex<LogState>,
    retention: usize,
    clock: Arc<dyn Clock>,
}

impl InMemoryMessageLog {
    /// 新しい InMemoryMessageLog を作成
    ///
    /// # Arguments
    ///
    /// * `retention` - 保持するメッセージ件数（超えた分は古い順に削除）
    /// * `clock` - メッセージのタイムスタンプに使う時計
    pub fn new(retention: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(LogState::default()),
            retention,
            clock,
        }
    }

    /// 保存されているメッセージ数
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.state.lock().await.messages.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl MessageLog for InMemoryMessageLog {
    async fn append(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        let mut state = self.state.lock().await;

        // タイムスタンプは単調増加にする（since による取得で取りこぼさないため）
        let now = self.clock.now_millis();
        let created_at = state
            .messages
            .last()
            .map_or(now, |last| now.max(last.created_at.value()));

        state.last_id += 1;
        let stored = Message {
            id: MessageId::new(state.last_id),
            author: message.author,
            text: message.text,
            created_at: Timestamp::new(created_at),
            parent_id: message.parent_id,
            profile_picture_url: message.profile_picture_url,
            reactions: Vec::new(),
        };
        state.messages.push(stored.clone());
        state.prune(self.retention);

        Ok(stored)
    }

    async fn delete(&self, id: MessageId) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        Ok(state.remove(id))
    }

    async fn delete_many(&self, ids: &[MessageId]) -> Result<usize, RepositoryError> {
        let mut state = self.state.lock().await;
        Ok(ids.iter().filter(|id| state.remove(**id)).count())
    }

    async fn find(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .iter()
            .find(|m| m.id == id)
            .map(|m| state.with_reactions(m)))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Message>, RepositoryError> {
        let state = self.state.lock().await;
        let skip = state.messages.len().saturating_sub(limit);
        Ok(state
            .messages
            .iter()
            .skip(skip)
            .map(|m| state.with_reactions(m))
            .collect())
    }

    async fn list_since(&self, since: Timestamp) -> Result<Vec<Message>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.created_at > since)
            .map(|m| state.with_reactions(m))
            .collect())
    }

    async fn replies_to(&self, id: MessageId) -> Result<Vec<Message>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.is_reply_to(id))
            .map(|m| state.with_reactions(m))
            .collect())
    }

    async fn toggle_reaction(
        &self,
        id: MessageId,
        username: &Username,
        reaction_type: &ReactionType,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.messages.iter().any(|m| m.id == id) {
            return Err(RepositoryError::MessageNotFound(id));
        }

        let existing = state.reactions.iter().position(|r| {
            r.message_id == id && &r.username == username && &r.reaction_type == reaction_type
        });
        match existing {
            Some(index) => {
                state.reactions.remove(index);
                Ok(false)
            }
            None => {
                state.reactions.push(StoredReaction {
                    message_id: id,
                    username: username.clone(),
                    reaction_type: reaction_type.clone(),
                });
                Ok(true)
            }
        }
    }

    async fn reactions_for(&self, id: MessageId) -> Result<Vec<ReactionGroup>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.reactions_for(id))
    }
}
