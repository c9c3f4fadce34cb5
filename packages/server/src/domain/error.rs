//! Domain layer error definitions.

use thiserror::Error;

use super::value_object::MessageId;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// Username validation error
    #[error("Username cannot be empty")]
    UsernameEmpty,

    /// Username too long error
    #[error("Username cannot exceed {max} characters (got {actual})")]
    UsernameTooLong { max: usize, actual: usize },

    /// MessageText validation error
    #[error("Message cannot be empty")]
    MessageTextEmpty,

    /// MessageText too long error
    #[error("Message too long (max {max} characters, got {actual})")]
    MessageTextTooLong { max: usize, actual: usize },

    #[error("Reaction type cannot be empty")]
    ReactionTypeEmpty,

    #[error("Reaction type cannot exceed {max} characters (got {actual})")]
    ReactionTypeTooLong { max: usize, actual: usize },

    /// ConnectionId invalid format error (not a valid UUID format)
    #[error("ConnectionId must be a valid UUID format (got: {0})")]
    ConnectionIdInvalidFormat(String),
}

/// Errors raised by the external stores (message log, user directory)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The store could not be reached or refused the write
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The referenced message does not exist in the log
    #[error("message {0} not found in the log")]
    MessageNotFound(MessageId),
}
