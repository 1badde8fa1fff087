//! Entities: connections, events and client commands.

use super::{
    error::ValueObjectError,
    value_object::{ConnectionId, ErrorCode, MessageContent, RoomCode, Severity, Timestamp, Username},
};

/// One client's live link to exactly one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub username: Username,
    pub room: RoomCode,
    pub joined_at: Timestamp,
}

impl Connection {
    pub fn new(username: Username, room: RoomCode, joined_at: Timestamp) -> Self {
        Self {
            id: ConnectionId::generate(),
            username,
            room,
            joined_at,
        }
    }
}

/// Reference to a file that the upload service has already stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub url: String,
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// MIME type, e.g. `application/pdf`
    pub content_type: String,
}

impl FileRef {
    pub fn new(
        url: String,
        name: String,
        size: u64,
        content_type: String,
    ) -> Result<Self, ValueObjectError> {
        if url.trim().is_empty() {
            return Err(ValueObjectError::Empty("file_url"));
        }
        if name.trim().is_empty() {
            return Err(ValueObjectError::Empty("file_name"));
        }
        Ok(Self {
            url,
            name,
            size,
            content_type,
        })
    }
}

/// Kind-specific payload of an [`Event`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Join { room_users: Vec<Username> },
    Leave { room_users: Vec<Username> },
    Chat { content: MessageContent },
    File(FileRef),
    TypingStart,
    TypingStop,
    Error {
        code: ErrorCode,
        severity: Severity,
        message: String,
    },
}

/// One discrete unit delivered to room members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub username: Username,
    pub timestamp: Timestamp,
}

impl Event {
    pub fn new(kind: EventKind, username: Username, timestamp: Timestamp) -> Self {
        Self {
            kind,
            username,
            timestamp,
        }
    }

    pub fn chat(username: Username, content: MessageContent, timestamp: Timestamp) -> Self {
        Self::new(EventKind::Chat { content }, username, timestamp)
    }

    pub fn file(username: Username, file: FileRef, timestamp: Timestamp) -> Self {
        Self::new(EventKind::File(file), username, timestamp)
    }

    /// Wire discriminator of this event
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            EventKind::Join { .. } => "join",
            EventKind::Leave { .. } => "leave",
            EventKind::Chat { .. } => "chat",
            EventKind::File(_) => "file",
            EventKind::TypingStart => "typing_start",
            EventKind::TypingStop => "typing_stop",
            EventKind::Error { .. } => "error",
        }
    }

    /// Only chat and file events are replayed to newcomers.
    pub fn is_history_entry(&self) -> bool {
        matches!(self.kind, EventKind::Chat { .. } | EventKind::File(_))
    }
}

/// A validated request coming from a joined connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Chat(MessageContent),
    File(FileRef),
    TypingStart,
    TypingStop,
}
