//! Presence reconciliation.
//!
//! Turns last-seen timestamps into the published "online users" view and
//! drives the periodic tick that catches users going stale.

use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures_util::FutureExt;
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};

use crate::domain::{PresenceStore, Timestamp, Username};

use super::hub::BroadcastHub;

/// Default period of the presence tick
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(2);

/// Remembers the last published online view
#[derive(Debug, Clone)]
pub struct PresenceReconciler {
    threshold: Duration,
    published: Vec<Username>,
}

impl PresenceReconciler {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            published: Vec::new(),
        }
    }

    /// Online view of `store` at `now`
    pub fn derive(&self, store: &PresenceStore, now: Timestamp) -> Vec<Username> {
        store.online_users(now, self.threshold)
    }

    /// Recompute the view; `Some` only when it differs from the published one.
    pub fn reconcile(&mut self, store: &PresenceStore, now: Timestamp) -> Option<Vec<Username>> {
        let online = self.derive(store, now);
        if online == self.published {
            return None;
        }
        self.published = online.clone();
        Some(online)
    }

    pub fn published(&self) -> &[Username] {
        &self.published
    }

    #[cfg(test)]
    pub fn threshold(&self) -> Duration {
        self.threshold
    }
}

/// Handle to the running presence tick
pub struct ReconcilerTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ReconcilerTask {
    /// Stop ticking and wait for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            tracing::error!("Presence ticker ended abnormally: {}", e);
        }
    }
}

/// Spawn the task that reconciles presence every `interval`.
///
/// A tick that panics is logged and the next tick runs as usual.
pub fn spawn_ticker(hub: Arc<BroadcastHub>, interval: Duration) -> ReconcilerTask {
    let (shutdown, mut shutdown_rx) = watch::channel(false);
    let period = interval.max(Duration::from_millis(1));

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!("Presence ticker started (every {:?})", period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match AssertUnwindSafe(hub.reconcile()).catch_unwind().await {
                        Ok(true) => tracing::debug!("Presence tick published a new online view"),
                        Ok(false) => {}
                        Err(_) => tracing::error!("Presence tick panicked, continuing"),
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("Presence ticker stopped");
    });

    ReconcilerTask { shutdown, handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::realtime::hub::InboundEvent;
    use agora_shared::time::ManualClock;
    use tokio::sync::mpsc;

    const THRESHOLD: Duration = Duration::from_secs(10);

    fn user(name: &str) -> Username {
        Username::new(name).unwrap()
    }

    #[test]
    fn test_reconcile_reports_only_changes() {
        // テスト項目: 結果が変わったときだけ Some が返される
        // given (前提条件):
        let mut store = PresenceStore::new();
        let mut reconciler = PresenceReconciler::new(THRESHOLD);
        store.touch(&user("alice"), Timestamp::new(0));

        // when (操作):
        let first = reconciler.reconcile(&store, Timestamp::new(1_000));
        let second = reconciler.reconcile(&store, Timestamp::new(2_000));

        // then (期待する結果):
        assert_eq!(first, Some(vec![user("alice")]));
        assert_eq!(second, None);
        assert_eq!(reconciler.published(), &[user("alice")]);
    }

    #[test]
    fn test_reconcile_after_touch_sequence() {
        // テスト項目: 任意の touch 列の後、閾値内に touch されたユーザーだけが重複なく残る
        // given (前提条件):
        let mut store = PresenceStore::new();
        let mut reconciler = PresenceReconciler::new(THRESHOLD);
        let touches = [
            ("bob", 1_000),
            ("alice", 4_000),
            ("bob", 6_000),
            ("carol", 2_000),
            ("alice", 11_000),
        ];
        for (name, at) in touches {
            store.touch(&user(name), Timestamp::new(at));
        }

        // when (操作):
        let online = reconciler.reconcile(&store, Timestamp::new(12_500));

        // then (期待する結果): carol は 10.5 秒前なので除外
        assert_eq!(online, Some(vec![user("alice"), user("bob")]));
    }

    #[test]
    fn test_empty_store_publishes_nothing() {
        // テスト項目: 誰もいない状態の初回 reconcile はブロードキャスト不要
        // given (前提条件):
        let store = PresenceStore::new();
        let mut reconciler = PresenceReconciler::new(THRESHOLD);

        // when (操作):
        let result = reconciler.reconcile(&store, Timestamp::new(0));

        // then (期待する結果):
        assert_eq!(result, None);
        assert_eq!(reconciler.threshold(), THRESHOLD);
    }

    #[tokio::test]
    async fn test_ticker_broadcasts_stale_users_and_stops() {
        // テスト項目: tick で古くなったユーザーがオフラインになり、shutdown で停止する
        // given (前提条件):
        let clock = Arc::new(ManualClock::new(0));
        let hub = Arc::new(BroadcastHub::new(THRESHOLD, clock.clone()));
        let (tx, mut rx) = mpsc::channel(64);
        let id = hub.register(tx).await;
        hub.handle_event(&id, InboundEvent::UserOnline(user("alice")))
            .await
            .unwrap();
        while rx.try_recv().is_ok() {}

        // when (操作):
        let task = spawn_ticker(hub.clone(), Duration::from_millis(20));
        clock.advance(10_000);

        // then (期待する結果):
        let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(frame, r#"{"event":"online-users","data":[]}"#);

        // when (操作):
        task.shutdown().await;
        hub.touch(&user("bob")).await;
        clock.advance(10_000);
        tokio::time::sleep(Duration::from_millis(100)).await;

        // then (期待する結果): touch による通知のみで、停止後の tick は発生しない
        assert_eq!(
            rx.recv().await.unwrap(),
            r#"{"event":"online-users","data":["bob"]}"#
        );
        assert!(rx.try_recv().is_err());
    }
}
