//! InMemory UserDirectory 実装
//!
//! ユーザーごとの最終オンライン時刻を BTreeMap に保持します。

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{RepositoryError, Timestamp, UserDirectory, UserSummary, Username};

/// インメモリ UserDirectory 実装
#[derive(Default)]
pub struct InMemoryUserDirectory {
    last_seen: Mutex<BTreeMap<Username, Option<Timestamp>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既知のユーザーを（最終オンライン時刻なしで）登録
    #[cfg(test)]
    pub async fn register(&self, username: Username) {
        self.last_seen.lock().await.entry(username).or_insert(None);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn touch_last_seen(
        &self,
        username: &Username,
        at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut last_seen = self.last_seen.lock().await;
        let entry = last_seen.entry(username.clone()).or_insert(None);
        // 遅れて届いた古い heartbeat では巻き戻さない
        if entry.is_none_or(|current| current < at) {
            *entry = Some(at);
        }
        Ok(())
    }

    async fn list_active_since(&self, since: Timestamp) -> Result<Vec<Username>, RepositoryError> {
        let last_seen = self.last_seen.lock().await;
        Ok(last_seen
            .iter()
            .filter(|(_, at)| at.is_some_and(|at| at > since))
            .map(|(username, _)| username.clone())
            .collect())
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>, RepositoryError> {
        let last_seen = self.last_seen.lock().await;
        Ok(last_seen
            .iter()
            .map(|(username, at)| UserSummary {
                username: username.clone(),
                last_online_at: *at,
            })
            .collect())
    }
}
