//! Realtime fan-out: connection registry, presence and typing broadcasts.

pub mod hub;
pub mod reconciler;

pub use hub::{BroadcastHub, DEFAULT_ONLINE_THRESHOLD, HubError, InboundEvent};
pub use reconciler::{DEFAULT_TICK_INTERVAL, PresenceReconciler, ReconcilerTask, spawn_ticker};
