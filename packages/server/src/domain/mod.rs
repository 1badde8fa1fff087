//! Domain layer.
//!
//! Value objects, entities and the interfaces (traits) that the use case layer
//! depends on. Concrete implementations live in the infrastructure layer.

pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use entity::{ClientCommand, Connection, Event, EventKind, FileRef};
pub use error::{MessagePushError, RepositoryError, ValueObjectError};
pub use message_pusher::{BroadcastReport, MessagePusher, PusherChannel};
pub use repository::{ConnectionRegistry, HistoryBuffer, PresenceTracker, RoomDirectory};
#[cfg(test)]
pub use repository::MockRoomDirectory;
pub use value_object::{
    ConnectionId, ErrorCode, MessageContent, RoomCode, Severity, Timestamp, Username,
};
