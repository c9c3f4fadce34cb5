//! External services the core calls but does not implement.

use async_trait::async_trait;
use thiserror::Error;

use super::entity::Message;

/// Failure reported by a reply generator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("reply generation failed: {0}")]
pub struct ReplyError(pub String);

/// Produces the text of an AI reply. Prompting and model access live behind this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// `history` is the recent conversation (oldest first) and contains `target`.
    async fn generate(&self, history: &[Message], target: &Message) -> Result<String, ReplyError>;
}
