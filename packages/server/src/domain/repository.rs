//! Repository trait 定義
//!
//! ドメイン層が必要とするルーム状態ストアのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! どのストアもルームコード単位で状態を分離して保持します。異なるルームへの
//! 操作が互いを待たせてはいけません。

use async_trait::async_trait;
use tokio::time::Instant;

use super::{ConnectionId, Event, RepositoryError, RoomCode, Username, entity::Connection};

/// Live connections per room.
///
/// Member lists are returned in join order. Every mutation returns the member
/// list computed under the same lock as the mutation itself.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Register a connection in its room. Idempotent per connection handle.
    async fn register(&self, connection: Connection) -> Vec<Username>;

    /// Remove a connection. Returns `None` when it was not registered.
    async fn deregister(
        &self,
        room: &RoomCode,
        connection_id: &ConnectionId,
    ) -> Option<Vec<Username>>;

    /// Usernames of the room's members, in join order
    async fn members_of(&self, room: &RoomCode) -> Vec<Username>;

    /// Handles of the room's connections, in join order
    async fn connections_of(&self, room: &RoomCode) -> Vec<ConnectionId>;

    /// Every room with at least one member, ordered by room code
    async fn rooms(&self) -> Vec<(RoomCode, Vec<Username>)>;
}

/// Per-room "is typing" set with deadlines.
#[async_trait]
pub trait PresenceTracker: Send + Sync {
    /// Insert or refresh `username`. Returns `true` on a transition from
    /// "not typing" to "typing".
    async fn start_typing(&self, room: &RoomCode, username: &Username, deadline: Instant) -> bool;

    /// Remove `username`. Returns `true` if it was typing.
    async fn stop_typing(&self, room: &RoomCode, username: &Username) -> bool;

    /// Usernames currently typing, ordered by name
    async fn snapshot(&self, room: &RoomCode) -> Vec<Username>;

    /// Remove and return every entry of the room whose deadline is at or before `now`.
    async fn take_expired(&self, room: &RoomCode, now: Instant) -> Vec<Username>;

    /// Rooms that currently have at least one typing user
    async fn rooms(&self) -> Vec<RoomCode>;

    /// Forget the room entirely
    async fn clear(&self, room: &RoomCode);
}

/// Bounded, insertion-ordered replay buffer of chat and file events.
#[async_trait]
pub trait HistoryBuffer: Send + Sync {
    /// Append an event, evicting the oldest entries beyond the cap.
    async fn append(&self, room: &RoomCode, event: Event) -> Result<(), RepositoryError>;

    /// The last `limit` entries, oldest first
    async fn snapshot(&self, room: &RoomCode, limit: usize) -> Vec<Event>;

    /// Number of stored entries
    async fn len(&self, room: &RoomCode) -> usize;

    /// Forget the room entirely
    async fn clear(&self, room: &RoomCode);
}

/// External room registry: decides whether a room code may be entered.
///
/// Whether an unknown code is created on first join or rejected is the
/// implementation's decision, not the session manager's.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    async fn admit(&self, room: &RoomCode) -> bool;
}
