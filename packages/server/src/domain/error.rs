//! Domain errors.

use thiserror::Error;

use super::value_object::ConnectionId;

/// Validation failure while constructing a value object
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{field} is too long ({actual} > {max} characters)")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
}

/// Failure reported by one of the in-memory stores
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("only chat and file events can be stored in history, got '{0}'")]
    NotHistoryEvent(&'static str),
}

/// Failure while pushing a message to a single connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' is not registered")]
    ConnectionNotFound(ConnectionId),
    #[error("outbound queue of connection '{0}' is full")]
    QueueFull(ConnectionId),
    #[error("connection '{0}' is closed")]
    Closed(ConnectionId),
    #[error("failed to encode event: {0}")]
    Encode(String),
}
