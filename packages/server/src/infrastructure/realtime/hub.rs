//! Connection registry and event fan-out.
//!
//! The hub owns every live connection together with the presence store, the
//! typing tracker and the last published online view. All of it sits behind
//! one async mutex, and fan-out happens while holding it, so every connection
//! receives events in the order the hub issued them.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use agora_shared::time::Clock;
use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use crate::{
    domain::{
        ConnectionId, ConnectionIdFactory, EventBroadcaster, PresenceStore, PresenceTracker,
        RealtimeEvent, Timestamp, TypingTracker, Username,
    },
    infrastructure::dto::websocket::encode_event,
};

use super::reconciler::PresenceReconciler;

/// Default time a user stays online after their last activity
pub const DEFAULT_ONLINE_THRESHOLD: Duration = Duration::from_secs(10);

/// Event received from a connected client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Bind the connection to a user and mark them active
    UserOnline(Username),
    /// Keep the bound user active
    Heartbeat,
    UserTyping(Username),
    UserStoppedTyping,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HubError {
    #[error("Connection '{0}' is not registered")]
    UnknownConnection(ConnectionId),
}

struct ConnectionEntry {
    sender: mpsc::Sender<String>,
    /// Set by the first `user-online` on this connection
    username: Option<Username>,
    connected_at: Timestamp,
}

struct HubState {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    presence: PresenceStore,
    typing: TypingTracker,
    reconciler: PresenceReconciler,
}

impl HubState {
    fn has_other_connection(&self, username: &Username, except: &ConnectionId) -> bool {
        self.connections
            .iter()
            .any(|(id, entry)| id != except && entry.username.as_ref() == Some(username))
    }

    fn online_change(&mut self, now: Timestamp) -> Option<RealtimeEvent> {
        self.reconciler
            .reconcile(&self.presence, now)
            .map(RealtimeEvent::OnlineUsers)
    }

    fn typing_snapshot(&self) -> RealtimeEvent {
        RealtimeEvent::TypingUsers(self.typing.typing_users())
    }

    /// Remove a connection and return the events its departure causes.
    fn drop_connection(&mut self, id: &ConnectionId, now: Timestamp) -> Vec<RealtimeEvent> {
        let Some(entry) = self.connections.remove(id) else {
            return Vec::new();
        };

        let mut events = Vec::new();
        if self.typing.stop_all(id) {
            events.push(self.typing_snapshot());
        }
        if let Some(username) = &entry.username
            && !self.has_other_connection(username, id)
        {
            self.presence.expire(username);
        }
        events.extend(self.online_change(now));

        tracing::info!(
            "Connection '{}' removed after {} ms ({} remaining)",
            id,
            now.millis_since(entry.connected_at),
            self.connections.len()
        );
        events
    }

    /// Push a frame to one connection; `false` if it has to be dropped.
    fn push(&self, id: &ConnectionId, frame: &str) -> bool {
        let Some(entry) = self.connections.get(id) else {
            return true;
        };
        match entry.sender.try_send(frame.to_string()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Send queue of connection '{}' is full, dropping it", id);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("Send queue of connection '{}' is closed, dropping it", id);
                false
            }
        }
    }

    /// Fan events out to every connection.
    ///
    /// Connections that cannot take a frame are dropped, and the events their
    /// departure causes are queued behind the current ones.
    fn deliver(&mut self, events: impl IntoIterator<Item = RealtimeEvent>, now: Timestamp) {
        let mut queue: VecDeque<RealtimeEvent> = events.into_iter().collect();
        while let Some(event) = queue.pop_front() {
            let frame = match encode_event(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!("Failed to encode '{}' event: {}", event.name(), e);
                    continue;
                }
            };

            let failed: Vec<ConnectionId> = self
                .connections
                .keys()
                .filter(|id| !self.push(id, &frame))
                .cloned()
                .collect();
            tracing::debug!(
                "Broadcasted '{}' to {} connection(s)",
                event.name(),
                self.connections.len() - failed.len()
            );

            for id in failed {
                queue.extend(self.drop_connection(&id, now));
            }
        }
    }

    /// Send events to a single connection only.
    fn deliver_to(&mut self, id: &ConnectionId, events: &[RealtimeEvent], now: Timestamp) {
        for event in events {
            let frame = match encode_event(event) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!("Failed to encode '{}' event: {}", event.name(), e);
                    continue;
                }
            };
            if !self.push(id, &frame) {
                let follow_up = self.drop_connection(id, now);
                self.deliver(follow_up, now);
                return;
            }
        }
    }
}

/// Single fan-out point for realtime events
pub struct BroadcastHub {
    state: Mutex<HubState>,
    clock: Arc<dyn Clock>,
}

impl BroadcastHub {
    pub fn new(online_threshold: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(HubState {
                connections: HashMap::new(),
                presence: PresenceStore::new(),
                typing: TypingTracker::new(),
                reconciler: PresenceReconciler::new(online_threshold),
            }),
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// Add a connection to the fan-out set.
    ///
    /// The new connection immediately receives the current online and typing
    /// snapshots; nobody else is notified.
    pub async fn register(&self, sender: mpsc::Sender<String>) -> ConnectionId {
        let now = self.now();
        let id = ConnectionIdFactory::generate();
        let mut state = self.state.lock().await;

        let changed = state.online_change(now);
        state.deliver(changed, now);

        state.connections.insert(
            id.clone(),
            ConnectionEntry {
                sender,
                username: None,
                connected_at: now,
            },
        );
        tracing::info!(
            "Connection '{}' registered ({} total)",
            id,
            state.connections.len()
        );

        let snapshot = [
            RealtimeEvent::OnlineUsers(state.reconciler.published().to_vec()),
            state.typing_snapshot(),
        ];
        state.deliver_to(&id, &snapshot, now);
        id
    }

    /// Remove a connection; returns `false` if it was already gone.
    ///
    /// The connection stops typing, and its user goes offline right away
    /// unless another connection is still bound to them.
    pub async fn unregister(&self, id: &ConnectionId) -> bool {
        let now = self.now();
        let mut state = self.state.lock().await;
        if !state.connections.contains_key(id) {
            return false;
        }
        let events = state.drop_connection(id, now);
        state.deliver(events, now);
        true
    }

    /// Apply one client event on behalf of connection `id`.
    pub async fn handle_event(&self, id: &ConnectionId, event: InboundEvent) -> Result<(), HubError> {
        let now = self.now();
        let mut state = self.state.lock().await;
        let Some(entry) = state.connections.get_mut(id) else {
            return Err(HubError::UnknownConnection(id.clone()));
        };

        let mut events = Vec::new();
        match event {
            InboundEvent::UserOnline(username) => {
                let previous = entry.username.replace(username.clone());
                if let Some(previous) = previous
                    && previous != username
                    && !state.has_other_connection(&previous, id)
                {
                    state.presence.expire(&previous);
                }
                state.presence.touch(&username, now);
                tracing::debug!("Connection '{}' is online as '{}'", id, username);
                events.extend(state.online_change(now));
            }
            InboundEvent::Heartbeat => match entry.username.clone() {
                Some(username) => {
                    state.presence.touch(&username, now);
                    events.extend(state.online_change(now));
                }
                None => {
                    tracing::debug!("Heartbeat from unbound connection '{}' ignored", id);
                }
            },
            InboundEvent::UserTyping(username) => {
                if state.typing.start(id, &username) {
                    events.push(state.typing_snapshot());
                }
            }
            InboundEvent::UserStoppedTyping => {
                if state.typing.stop(id) {
                    events.push(state.typing_snapshot());
                }
            }
        }

        state.deliver(events, now);
        Ok(())
    }

    /// Mark `username` active without a connection (poll clients).
    pub async fn touch(&self, username: &Username) {
        let now = self.now();
        let mut state = self.state.lock().await;
        state.presence.touch(username, now);
        let changed = state.online_change(now);
        state.deliver(changed, now);
    }

    /// Recompute the online view and broadcast it if it changed.
    pub async fn reconcile(&self) -> bool {
        let now = self.now();
        let mut state = self.state.lock().await;
        match state.online_change(now) {
            Some(event) => {
                state.deliver([event], now);
                true
            }
            None => false,
        }
    }

    /// Send an event to every registered connection.
    pub async fn broadcast(&self, event: RealtimeEvent) {
        let now = self.now();
        let mut state = self.state.lock().await;
        state.deliver([event], now);
    }

    /// Users online right now, sorted.
    pub async fn online_users(&self) -> Vec<Username> {
        let now = self.now();
        let mut state = self.state.lock().await;
        let changed = state.online_change(now);
        state.deliver(changed, now);
        state.reconciler.published().to_vec()
    }

    /// User bound to a connection by `user-online`
    pub async fn bound_user(&self, id: &ConnectionId) -> Option<Username> {
        let state = self.state.lock().await;
        state.connections.get(id)?.username.clone()
    }

    pub async fn typing_users(&self) -> Vec<Username> {
        self.state.lock().await.typing.typing_users()
    }

    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.connections.len()
    }

    /// Drop every connection without notifying anyone.
    ///
    /// Closing the send queues ends each connection's writer task.
    pub async fn close_all(&self) {
        let mut state = self.state.lock().await;
        let closed = state.connections.len();
        state.connections.clear();
        tracing::info!("Closed {} connection(s)", closed);
    }
}

#[async_trait]
impl EventBroadcaster for BroadcastHub {
    async fn broadcast(&self, event: RealtimeEvent) {
        BroadcastHub::broadcast(self, event).await;
    }
}

#[async_trait]
impl PresenceTracker for BroadcastHub {
    async fn touch(&self, username: &Username) {
        BroadcastHub::touch(self, username).await;
    }

    async fn online_users(&self) -> Vec<Username> {
        BroadcastHub::online_users(self).await
    }
}
