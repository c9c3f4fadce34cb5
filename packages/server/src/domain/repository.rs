//! Repository traits for the external stores.
//!
//! The message log and the user directory are the durable source of truth;
//! everything the realtime core keeps in memory is derived from them or from
//! incoming heartbeats.

use async_trait::async_trait;

use super::{
    entity::{Message, NewMessage, ReactionGroup, UserSummary},
    error::RepositoryError,
    value_object::{MessageId, ReactionType, Timestamp, Username},
};

/// Durable, append-mostly message log.
///
/// Listing methods return messages oldest first with their reactions filled in.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageLog: Send + Sync {
    /// Append a message; the log assigns id and timestamp and prunes beyond its retention.
    async fn append(&self, message: NewMessage) -> Result<Message, RepositoryError>;

    /// Delete one message (not its replies). Returns `false` if it did not exist.
    async fn delete(&self, id: MessageId) -> Result<bool, RepositoryError>;

    /// Delete every listed message in one write. On error none of them is deleted.
    /// Returns how many existed.
    async fn delete_many(&self, ids: &[MessageId]) -> Result<usize, RepositoryError>;

    async fn find(&self, id: MessageId) -> Result<Option<Message>, RepositoryError>;

    /// The `limit` most recent messages
    async fn list_recent(&self, limit: usize) -> Result<Vec<Message>, RepositoryError>;

    /// Messages created strictly after `since`
    async fn list_since(&self, since: Timestamp) -> Result<Vec<Message>, RepositoryError>;

    /// Direct replies to `id`, in id order
    async fn replies_to(&self, id: MessageId) -> Result<Vec<Message>, RepositoryError>;

    /// Add the reaction, or remove it if the same triple already exists.
    /// Returns `true` when the reaction was added.
    async fn toggle_reaction(
        &self,
        id: MessageId,
        username: &Username,
        reaction_type: &ReactionType,
    ) -> Result<bool, RepositoryError>;

    async fn reactions_for(&self, id: MessageId) -> Result<Vec<ReactionGroup>, RepositoryError>;
}

/// Durable per-user last-seen times
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn touch_last_seen(&self, username: &Username, at: Timestamp)
    -> Result<(), RepositoryError>;

    /// Users whose last-seen time is strictly after `since`, sorted
    ///
    /// Not used by the single-process server, whose presence lives in the hub.
    /// Deployments that share presence across processes derive the online
    /// view from this instead.
    async fn list_active_since(&self, since: Timestamp) -> Result<Vec<Username>, RepositoryError>;

    /// Every known user, sorted by username
    async fn list_users(&self) -> Result<Vec<UserSummary>, RepositoryError>;
}
