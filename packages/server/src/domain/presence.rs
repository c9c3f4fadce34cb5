//! Presence store.
//!
//! One [`PresenceRecord`] per known user (not per connection). Records are
//! never deleted: a stale record simply drops out of the online view.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;

use super::value_object::{Timestamp, Username};

/// Live presence view maintained by the realtime layer
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresenceTracker: Send + Sync {
    /// Record activity for a user that may have no live connection
    async fn touch(&self, username: &Username);

    /// Users online right now, sorted
    async fn online_users(&self) -> Vec<Username>;
}

/// Last activity of one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceRecord {
    pub username: Username,
    pub last_seen_at: Timestamp,
    /// Set when the user's last connection went away; cleared by the next touch
    pub departed: bool,
}

impl PresenceRecord {
    /// Whether the user counts as online at `now`
    pub fn is_online(&self, now: Timestamp, threshold: Duration) -> bool {
        !self.departed && now.millis_since(self.last_seen_at) < threshold_millis(threshold)
    }
}

/// In-memory table of last-seen timestamps
#[derive(Debug, Default, Clone)]
pub struct PresenceStore {
    records: HashMap<Username, PresenceRecord>,
}

impl PresenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record activity for `username` at `at` (create-if-absent).
    ///
    /// `last_seen_at` never moves backwards: an update older than the stored
    /// one is ignored and returns `false`.
    pub fn touch(&mut self, username: &Username, at: Timestamp) -> bool {
        match self.records.get_mut(username) {
            Some(record) if at < record.last_seen_at => false,
            Some(record) => {
                record.last_seen_at = at;
                record.departed = false;
                true
            }
            None => {
                self.records.insert(
                    username.clone(),
                    PresenceRecord {
                        username: username.clone(),
                        last_seen_at: at,
                        departed: false,
                    },
                );
                true
            }
        }
    }

    /// Take `username` offline now instead of waiting for staleness.
    pub fn expire(&mut self, username: &Username) {
        if let Some(record) = self.records.get_mut(username) {
            record.departed = true;
        }
    }

    /// Users seen within `threshold` of `now`, sorted and deduplicated
    pub fn online_users(&self, now: Timestamp, threshold: Duration) -> Vec<Username> {
        let mut online: Vec<Username> = self
            .records
            .values()
            .filter(|record| record.is_online(now, threshold))
            .map(|record| record.username.clone())
            .collect();
        online.sort();
        online
    }

    #[cfg(test)]
    pub fn get(&self, username: &Username) -> Option<&PresenceRecord> {
        self.records.get(username)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn threshold_millis(threshold: Duration) -> i64 {
    i64::try_from(threshold.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: Duration = Duration::from_secs(10);

    fn user(name: &str) -> Username {
        Username::new(name).unwrap()
    }

    #[test]
    fn test_touch_creates_record() {
        // テスト項目: 初回の touch でレコードが作成される
        // given (前提条件):
        let mut store = PresenceStore::new();

        // when (操作):
        let changed = store.touch(&user("alice"), Timestamp::new(1_000));

        // then (期待する結果):
        assert!(changed);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get(&user("alice")).unwrap().last_seen_at,
            Timestamp::new(1_000)
        );
    }

    #[test]
    fn test_touch_never_regresses_last_seen() {
        // テスト項目: 古いタイムスタンプでの touch は last_seen_at を巻き戻さない
        // given (前提条件):
        let mut store = PresenceStore::new();
        store.touch(&user("alice"), Timestamp::new(5_000));

        // when (操作):
        let changed = store.touch(&user("alice"), Timestamp::new(3_000));

        // then (期待する結果):
        assert!(!changed);
        assert_eq!(
            store.get(&user("alice")).unwrap().last_seen_at,
            Timestamp::new(5_000)
        );
    }

    #[test]
    fn test_online_users_respects_threshold() {
        // テスト項目: threshold 以内に touch されたユーザーだけがオンラインになる
        // given (前提条件):
        let mut store = PresenceStore::new();
        store.touch(&user("carol"), Timestamp::new(0));
        store.touch(&user("bob"), Timestamp::new(5_000));
        store.touch(&user("alice"), Timestamp::new(9_000));

        // when (操作):
        let online = store.online_users(Timestamp::new(12_000), THRESHOLD);

        // then (期待する結果): carol は 12 秒前なので除外、結果はソート済み
        assert_eq!(online, vec![user("alice"), user("bob")]);
    }

    #[test]
    fn test_online_users_boundary_is_exclusive() {
        // テスト項目: ちょうど threshold 経過したユーザーはオフライン扱い
        // given (前提条件):
        let mut store = PresenceStore::new();
        store.touch(&user("alice"), Timestamp::new(0));

        // then (期待する結果):
        assert_eq!(
            store.online_users(Timestamp::new(9_999), THRESHOLD),
            vec![user("alice")]
        );
        assert!(store.online_users(Timestamp::new(10_000), THRESHOLD).is_empty());
    }

    #[test]
    fn test_repeated_touches_are_deduplicated() {
        // テスト項目: 同じユーザーの複数回の touch は 1 件にまとめられる
        // given (前提条件):
        let mut store = PresenceStore::new();

        // when (操作):
        for t in [1_000, 2_000, 3_000] {
            store.touch(&user("alice"), Timestamp::new(t));
        }

        // then (期待する結果):
        assert_eq!(
            store.online_users(Timestamp::new(3_000), THRESHOLD),
            vec![user("alice")]
        );
    }

    #[test]
    fn test_expire_takes_user_offline_immediately() {
        // テスト項目: expire したユーザーは staleness を待たずにオフラインになる
        // given (前提条件):
        let mut store = PresenceStore::new();
        store.touch(&user("alice"), Timestamp::new(1_000));

        // when (操作):
        store.expire(&user("alice"));

        // then (期待する結果):
        assert!(store.online_users(Timestamp::new(1_000), THRESHOLD).is_empty());
    }

    #[test]
    fn test_touch_after_expire_brings_user_back() {
        // テスト項目: expire 後の新しい touch でオンラインに戻るが、古い touch では戻らない
        // given (前提条件):
        let mut store = PresenceStore::new();
        store.touch(&user("alice"), Timestamp::new(2_000));
        store.expire(&user("alice"));

        // when (操作): 遅れて届いた古い heartbeat
        store.touch(&user("alice"), Timestamp::new(1_500));

        // then (期待する結果):
        assert!(store.online_users(Timestamp::new(2_000), THRESHOLD).is_empty());

        // when (操作): 新しい heartbeat
        store.touch(&user("alice"), Timestamp::new(2_000));

        // then (期待する結果):
        assert_eq!(
            store.online_users(Timestamp::new(2_000), THRESHOLD),
            vec![user("alice")]
        );
    }
}
