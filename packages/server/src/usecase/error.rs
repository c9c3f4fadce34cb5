//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{MessageId, RepositoryError, ValueObjectError};

/// MessageRelay のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error(transparent)]
    Validation(#[from] ValueObjectError),
    #[error("Message {0} not found")]
    NotFound(MessageId),
    #[error("Message log error: {0}")]
    Storage(RepositoryError),
}

impl From<RepositoryError> for RelayError {
    fn from(error: RepositoryError) -> Self {
        match error {
            // 確認後に消えたメッセージは NotFound として扱う
            RepositoryError::MessageNotFound(id) => RelayError::NotFound(id),
            other => RelayError::Storage(other),
        }
    }
}

/// heartbeat 記録のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeartbeatError {
    #[error(transparent)]
    Validation(#[from] ValueObjectError),
    #[error("User directory error: {0}")]
    Storage(#[from] RepositoryError),
}

/// AI 返信のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AiReplyError {
    #[error("AI replies are not configured")]
    NotConfigured,
    #[error("Message {0} not found")]
    NotFound(MessageId),
    #[error("Reply generator failed: {0}")]
    Upstream(String),
    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// 読み取り系ユースケースのエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Storage error: {0}")]
pub struct QueryError(#[from] pub RepositoryError);
