//! Typing tracker.
//!
//! Typing state is per connection: a connection contributes at most one
//! record, and a new connection always starts not typing.

use std::collections::HashMap;

use super::value_object::{ConnectionId, Username};

#[derive(Debug, Default, Clone)]
pub struct TypingTracker {
    records: HashMap<ConnectionId, Username>,
}

impl TypingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `connection_id` as typing as `username`.
    ///
    /// Returns `false` if the connection was already typing as that user.
    pub fn start(&mut self, connection_id: &ConnectionId, username: &Username) -> bool {
        match self.records.insert(connection_id.clone(), username.clone()) {
            Some(previous) => &previous != username,
            None => true,
        }
    }

    /// Returns `false` if the connection was not typing.
    pub fn stop(&mut self, connection_id: &ConnectionId) -> bool {
        self.records.remove(connection_id).is_some()
    }

    /// Drop every typing record of a connection that is going away.
    pub fn stop_all(&mut self, connection_id: &ConnectionId) -> bool {
        // one record per connection, so this is `stop` under the unregister name
        self.stop(connection_id)
    }

    /// Distinct typing usernames, sorted
    pub fn typing_users(&self) -> Vec<Username> {
        let mut users: Vec<Username> = self.records.values().cloned().collect();
        users.sort();
        users.dedup();
        users
    }

    #[cfg(test)]
    pub fn is_typing(&self, connection_id: &ConnectionId) -> bool {
        self.records.contains_key(connection_id)
    }
}
