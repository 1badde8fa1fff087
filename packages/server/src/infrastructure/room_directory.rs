//! Room directory implementations.
//!
//! The room registry that owns room codes is an external service. These two
//! implementations cover its two policies: create-on-join and reject-unknown.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::{RoomCode, RoomDirectory};

/// Admits every room code; rooms are created on first join.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenRoomDirectory;

#[async_trait]
impl RoomDirectory for OpenRoomDirectory {
    async fn admit(&self, _room: &RoomCode) -> bool {
        true
    }
}

/// Admits only a fixed set of pre-registered room codes.
#[derive(Debug, Default, Clone)]
pub struct StaticRoomDirectory {
    rooms: HashSet<RoomCode>,
}

impl StaticRoomDirectory {
    pub fn new(rooms: impl IntoIterator<Item = RoomCode>) -> Self {
        Self {
            rooms: rooms.into_iter().collect(),
        }
    }
}

#[async_trait]
impl RoomDirectory for StaticRoomDirectory {
    async fn admit(&self, room: &RoomCode) -> bool {
        self.rooms.contains(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(code: &str) -> RoomCode {
        RoomCode::new(code.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_open_directory_admits_anything() {
        // テスト項目: OpenRoomDirectory は未知のルームコードも受け入れる
        // given (前提条件):
        let directory = OpenRoomDirectory;

        // when (操作) / then (期待する結果):
        assert!(directory.admit(&room("never-created")).await);
    }

    #[tokio::test]
    async fn test_static_directory_rejects_unknown_rooms() {
        // テスト項目: StaticRoomDirectory は登録済みのルームのみ受け入れる
        // given (前提条件):
        let directory = StaticRoomDirectory::new([room("MATH-101")]);

        // when (操作) / then (期待する結果):
        assert!(directory.admit(&room("MATH-101")).await);
        assert!(!directory.admit(&room("PHYS-201")).await);
    }
}
