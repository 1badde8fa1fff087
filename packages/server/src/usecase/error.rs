//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{
    ConnectionId, ErrorCode, MessagePushError, RepositoryError, RoomCode, Severity,
    ValueObjectError,
};

/// Failure of a room session operation.
///
/// Every variant is scoped to a single connection (or a single join attempt);
/// none of them affects other members or other rooms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Malformed or empty input. Reported to the originator only.
    #[error("invalid message: {0}")]
    Validation(String),
    /// Send failure on one connection. Turned into an implicit leave.
    #[error(transparent)]
    Transport(#[from] MessagePushError),
    /// The room directory refused the room code.
    #[error("room '{0}' is not open for joining")]
    RoomRejected(RoomCode),
    /// The connection is not joined to the room it claims.
    #[error("connection '{0}' is not joined")]
    NotJoined(ConnectionId),
    /// A store rejected an operation that the session layer should never issue.
    #[error("internal error: {0}")]
    Internal(#[from] RepositoryError),
}

impl From<ValueObjectError> for SessionError {
    fn from(e: ValueObjectError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        Self::Validation(e.to_string())
    }
}

impl SessionError {
    /// Code carried by the `error` event sent to the affected connection
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::InvalidMessageFormat,
            Self::NotJoined(_) => ErrorCode::NotJoined,
            Self::Transport(_) | Self::RoomRejected(_) | Self::Internal(_) => {
                ErrorCode::InternalError
            }
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Validation(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Whether the connection must be closed after reporting this error
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Validation(_))
    }
}

/// Failure of a read-only room query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("room not found")]
    RoomNotFound,
}
