//! UseCase: メッセージ履歴・ユーザー一覧の取得

use std::sync::Arc;

use crate::domain::{Message, MessageLog, Timestamp, UserDirectory, UserSummary};

use super::error::QueryError;

/// メッセージ履歴取得のユースケース
pub struct ListMessagesUseCase {
    log: Arc<dyn MessageLog>,
    /// since 指定なしのときに返す件数
    recent_limit: usize,
}

impl ListMessagesUseCase {
    pub fn new(log: Arc<dyn MessageLog>, recent_limit: usize) -> Self {
        Self { log, recent_limit }
    }

    /// メッセージを古い順に取得
    ///
    /// * `since` あり - その時刻より後に作成された全メッセージ
    /// * `since` なし - 最新 `recent_limit` 件
    pub async fn execute(&self, since: Option<Timestamp>) -> Result<Vec<Message>, QueryError> {
        let messages = match since {
            Some(since) => self.log.list_since(since).await?,
            None => self.log.list_recent(self.recent_limit).await?,
        };
        Ok(messages)
    }
}

/// ユーザー一覧取得のユースケース
pub struct ListUsersUseCase {
    directory: Arc<dyn UserDirectory>,
}

impl ListUsersUseCase {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// 既知の全ユーザーをユーザー名順で取得
    pub async fn execute(&self) -> Result<Vec<UserSummary>, QueryError> {
        let mut users = self.directory.list_users().await?;
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            MessageText, NewMessage, RepositoryError, Username, repository::MockMessageLog,
            repository::MockUserDirectory,
        },
        infrastructure::repository::InMemoryMessageLog,
    };
    use agora_shared::time::ManualClock;

    fn new_message(text: &str) -> NewMessage {
        NewMessage {
            author: Username::new("alice").unwrap(),
            text: MessageText::new(text).unwrap(),
            parent_id: None,
            profile_picture_url: None,
        }
    }

    #[tokio::test]
    async fn test_post_then_list_since_zero_returns_once() {
        // テスト項目: 追加したメッセージは since=0 の取得でちょうど 1 回返され、削除後は返されない
        // given (前提条件):
        let log = Arc::new(InMemoryMessageLog::new(50, Arc::new(ManualClock::new(1_000))));
        let usecase = ListMessagesUseCase::new(log.clone(), 50);
        let message = log.append(new_message("hi")).await.unwrap();

        // when (操作):
        let listed = usecase.execute(Some(Timestamp::new(0))).await.unwrap();

        // then (期待する結果):
        assert_eq!(listed, vec![message.clone()]);

        // when (操作):
        log.delete(message.id).await.unwrap();

        // then (期待する結果):
        assert!(usecase.execute(Some(Timestamp::new(0))).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_without_since_returns_recent_limit() {
        // テスト項目: since なしの場合は最新 recent_limit 件が古い順で返される
        // given (前提条件):
        let log = Arc::new(InMemoryMessageLog::new(50, Arc::new(ManualClock::new(1_000))));
        let usecase = ListMessagesUseCase::new(log.clone(), 2);
        for text in ["a", "b", "c"] {
            log.append(new_message(text)).await.unwrap();
        }

        // when (操作):
        let listed = usecase.execute(None).await.unwrap();

        // then (期待する結果):
        let texts: Vec<&str> = listed.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_list_messages_storage_failure() {
        // テスト項目: ログの読み取り失敗は QueryError になる
        // given (前提条件):
        let mut log = MockMessageLog::new();
        log.expect_list_recent()
            .returning(|_| Err(RepositoryError::Unavailable("down".to_string())));
        let usecase = ListMessagesUseCase::new(Arc::new(log), 50);

        // when (操作):
        let result = usecase.execute(None).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(QueryError(RepositoryError::Unavailable("down".to_string())))
        );
    }

    #[tokio::test]
    async fn test_list_users_sorted_by_username() {
        // テスト項目: ユーザー一覧はユーザー名順に並べ替えられる
        // given (前提条件):
        let mut directory = MockUserDirectory::new();
        directory.expect_list_users().returning(|| {
            Ok(vec![
                UserSummary {
                    username: Username::new("zoe").unwrap(),
                    last_online_at: None,
                },
                UserSummary {
                    username: Username::new("alice").unwrap(),
                    last_online_at: Some(Timestamp::new(1)),
                },
            ])
        });
        let usecase = ListUsersUseCase::new(Arc::new(directory));

        // when (操作):
        let users = usecase.execute().await.unwrap();

        // then (期待する結果):
        let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "zoe"]);
    }
}
