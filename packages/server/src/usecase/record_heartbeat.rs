//! UseCase: heartbeat の記録
//!
//! ポーリングで動くクライアント向け。最終オンライン時刻を UserDirectory に
//! 書き込んでから、リアルタイム側のプレゼンスを更新します。

use std::sync::Arc;

use agora_shared::time::Clock;

use crate::domain::{PresenceTracker, Timestamp, UserDirectory, Username};

use super::error::HeartbeatError;

/// heartbeat 記録のユースケース
pub struct RecordHeartbeatUseCase {
    directory: Arc<dyn UserDirectory>,
    presence: Arc<dyn PresenceTracker>,
    clock: Arc<dyn Clock>,
}

impl RecordHeartbeatUseCase {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        presence: Arc<dyn PresenceTracker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            presence,
            clock,
        }
    }

    /// heartbeat を記録
    ///
    /// UserDirectory への書き込みに失敗した場合、プレゼンスは更新しません。
    pub async fn execute(&self, username: &str) -> Result<(), HeartbeatError> {
        let username = Username::new(username)?;
        let now = Timestamp::new(self.clock.now_millis());

        self.directory.touch_last_seen(&username, now).await?;
        self.presence.touch(&username).await;
        tracing::debug!("Heartbeat recorded for '{}'", username);
        Ok(())
    }
}
