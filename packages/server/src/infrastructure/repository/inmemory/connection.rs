//! InMemory Connection Registry 実装

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{Connection, ConnectionId, ConnectionRegistry, RoomCode, Username};

/// インメモリ Connection Registry 実装
///
/// Key: room code, Value: connections in join order.
/// A room's entry disappears together with its last connection.
#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    rooms: DashMap<RoomCode, Vec<Connection>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

fn usernames(connections: &[Connection]) -> Vec<Username> {
    connections.iter().map(|c| c.username.clone()).collect()
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(&self, connection: Connection) -> Vec<Username> {
        let mut entry = self.rooms.entry(connection.room.clone()).or_default();
        if !entry.iter().any(|c| c.id == connection.id) {
            tracing::debug!(
                "Connection '{}' ({}) registered in room '{}'",
                connection.id,
                connection.username,
                connection.room
            );
            entry.push(connection);
        }
        usernames(&entry)
    }

    async fn deregister(
        &self,
        room: &RoomCode,
        connection_id: &ConnectionId,
    ) -> Option<Vec<Username>> {
        let members = {
            let mut entry = self.rooms.get_mut(room)?;
            let position = entry.iter().position(|c| &c.id == connection_id)?;
            entry.remove(position);
            usernames(&entry)
        };
        self.rooms.remove_if(room, |_, connections| connections.is_empty());
        tracing::debug!(
            "Connection '{}' deregistered from room '{}'",
            connection_id,
            room
        );
        Some(members)
    }

    async fn members_of(&self, room: &RoomCode) -> Vec<Username> {
        self.rooms
            .get(room)
            .map(|entry| usernames(&entry))
            .unwrap_or_default()
    }

    async fn connections_of(&self, room: &RoomCode) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|entry| entry.iter().map(|c| c.id).collect())
            .unwrap_or_default()
    }

    async fn rooms(&self) -> Vec<(RoomCode, Vec<Username>)> {
        let mut rooms: Vec<(RoomCode, Vec<Username>)> = self
            .rooms
            .iter()
            .map(|entry| (entry.key().clone(), usernames(entry.value())))
            .collect();
        rooms.sort_by(|a, b| a.0.cmp(&b.0));
        rooms
    }
}
