//! UseCase: メッセージのライフサイクル（投稿・削除・リアクション）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - MessageRelay::post() / remove() / react()
//! - ログへの書き込みが成功した後にだけブロードキャストされること
//!
//! ### なぜこのテストが必要か
//! - メッセージログが唯一の正であり、クライアントへの通知はその結果に従う
//! - 返信を含む削除（カスケード）の通知順序をクライアントが前提にしている
//!
//! ### どのような状況を想定しているか
//! - 正常系：投稿、リアクションのトグル、返信ごとの削除
//! - 異常系：バリデーションエラー、存在しないメッセージ、ストレージ障害
//! - エッジケース：同じメッセージへの同時リアクション、配信前の投稿に対する削除

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, PoisonError},
};

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::{
    EventBroadcaster, Message, MessageId, MessageLog, MessageText, NewMessage, ReactionGroup,
    ReactionType, RealtimeEvent, Username,
};

use super::error::RelayError;

/// 投稿内容（未検証の入力）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostMessage {
    pub author: String,
    pub text: String,
    pub parent_id: Option<MessageId>,
    pub profile_picture_url: Option<String>,
}

impl PostMessage {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            parent_id: None,
            profile_picture_url: None,
        }
    }

    /// 返信先を指定
    pub fn reply_to(mut self, parent_id: MessageId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_profile_picture(mut self, url: impl Into<String>) -> Self {
        self.profile_picture_url = Some(url.into());
        self
    }
}

/// メッセージ id ごとの非同期ロック
///
/// 使われていない id のエントリは最後のガードが解放されたときに削除されます。
#[derive(Default)]
struct MessageLocks {
    locks: std::sync::Mutex<HashMap<MessageId, Arc<Mutex<()>>>>,
}

impl MessageLocks {
    async fn lock(&self, id: MessageId) -> MessageGuard<'_> {
        let mutex = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_default()
            .clone();
        let guard = mutex.lock_owned().await;
        MessageGuard {
            locks: self,
            id,
            guard: Some(guard),
        }
    }
}

struct MessageGuard<'a> {
    locks: &'a MessageLocks,
    id: MessageId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for MessageGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.id)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
        {
            locks.remove(&self.id);
        }
    }
}

/// メッセージの投稿・削除・リアクションを調停するユースケース
///
/// 同じメッセージ id に対する操作は直列化されます。投稿は new-message の配信が
/// 終わるまで、削除・リアクションを待たせます。
///
/// ロックの取得順は `publish` → メッセージ id ごとのロック。
pub struct MessageRelay {
    /// メッセージログ（データアクセス層の抽象化）
    log: Arc<dyn MessageLog>,
    /// リアルタイム配信
    broadcaster: Arc<dyn EventBroadcaster>,
    /// 投稿（追加 + new-message の配信）は write、削除・リアクションは read
    publish: RwLock<()>,
    locks: MessageLocks,
}

impl MessageRelay {
    pub fn new(log: Arc<dyn MessageLog>, broadcaster: Arc<dyn EventBroadcaster>) -> Self {
        Self {
            log,
            broadcaster,
            publish: RwLock::new(()),
            locks: MessageLocks::default(),
        }
    }

    /// メッセージを投稿し、new-message をブロードキャスト
    ///
    /// # Returns
    ///
    /// * `Ok(Message)` - ログが id とタイムスタンプを割り当てたメッセージ
    /// * `Err(RelayError::Validation)` - ユーザー名・本文が不正
    /// * `Err(RelayError::NotFound)` - 返信先が存在しない
    /// * `Err(RelayError::Storage)` - ログへの書き込み失敗（ブロードキャストなし）
    pub async fn post(&self, request: PostMessage) -> Result<Message, RelayError> {
        let author = Username::try_from(request.author)?;
        let text = MessageText::try_from(request.text)?;
        let profile_picture_url = request
            .profile_picture_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        // 新しい id は追加した時点でログから見えるので、配信まで他の操作を止める
        let _publish = self.publish.write().await;
        if let Some(parent_id) = request.parent_id
            && self.log.find(parent_id).await?.is_none()
        {
            return Err(RelayError::NotFound(parent_id));
        }

        let message = self
            .log
            .append(NewMessage {
                author,
                text,
                parent_id: request.parent_id,
                profile_picture_url,
            })
            .await?;
        tracing::info!("Message {} posted by '{}'", message.id, message.author);

        self.broadcaster
            .broadcast(RealtimeEvent::NewMessage(message.clone()))
            .await;
        Ok(message)
    }

    /// メッセージとその返信（再帰的）を削除し、delete-message をブロードキャスト
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<MessageId>)` - 削除した id（対象が先頭、続いて返信を id 順）
    pub async fn remove(&self, id: MessageId) -> Result<Vec<MessageId>, RelayError> {
        let _publish = self.publish.read().await;
        let mut guards = vec![self.locks.lock(id).await];
        if self.log.find(id).await?.is_none() {
            return Err(RelayError::NotFound(id));
        }

        // 返信の返信まで辿る
        let mut descendants = Vec::new();
        let mut frontier = VecDeque::from([id]);
        while let Some(parent) = frontier.pop_front() {
            for reply in self.log.replies_to(parent).await? {
                guards.push(self.locks.lock(reply.id).await);
                descendants.push(reply.id);
                frontier.push_back(reply.id);
            }
        }
        descendants.sort();
        descendants.dedup();

        let mut removed = Vec::with_capacity(descendants.len() + 1);
        removed.push(id);
        removed.extend(descendants);

        // 1 回の書き込みで全件削除する（失敗時は何も消えない）
        let children_first: Vec<MessageId> = removed.iter().rev().copied().collect();
        self.log.delete_many(&children_first).await?;
        tracing::info!(
            "Message {} deleted with {} reply message(s)",
            id,
            removed.len() - 1
        );

        for target in &removed {
            self.broadcaster
                .broadcast(RealtimeEvent::DeleteMessage(*target))
                .await;
        }
        drop(guards);
        Ok(removed)
    }

    /// リアクションをトグルし、完全なリアクション一覧をブロードキャスト
    pub async fn react(
        &self,
        id: MessageId,
        username: &str,
        reaction_type: &str,
    ) -> Result<Vec<ReactionGroup>, RelayError> {
        let username = Username::new(username)?;
        let reaction_type = ReactionType::new(reaction_type)?;

        let _publish = self.publish.read().await;
        let _guard = self.locks.lock(id).await;
        if self.log.find(id).await?.is_none() {
            return Err(RelayError::NotFound(id));
        }

        let added = self
            .log
            .toggle_reaction(id, &username, &reaction_type)
            .await?;
        let reactions = self.log.reactions_for(id).await?;
        tracing::debug!(
            "'{}' {} '{}' on message {}",
            username,
            if added { "added" } else { "removed" },
            reaction_type,
            id
        );

        self.broadcaster
            .broadcast(RealtimeEvent::MessageReaction {
                message_id: id,
                reactions: reactions.clone(),
            })
            .await;
        Ok(reactions)
    }
}
