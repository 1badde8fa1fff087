//! UseCase: ルーム一覧の取得

use std::sync::Arc;

use crate::domain::{ConnectionRegistry, RoomCode, Username};

/// Active room and its members in join order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub code: RoomCode,
    pub members: Vec<Username>,
}

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl GetRoomsUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Rooms with at least one member, ordered by room code
    pub async fn execute(&self) -> Vec<RoomSummary> {
        self.registry
            .rooms()
            .await
            .into_iter()
            .map(|(code, members)| RoomSummary { code, members })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Connection, Timestamp},
        infrastructure::repository::InMemoryConnectionRegistry,
    };

    #[tokio::test]
    async fn test_lists_rooms_with_members() {
        // テスト項目: メンバーのいるルームがコード順に一覧される
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        for (room, name) in [("b", "bob"), ("a", "alice"), ("a", "carol")] {
            registry
                .register(Connection::new(
                    Username::new(name.to_string()).unwrap(),
                    RoomCode::new(room.to_string()).unwrap(),
                    Timestamp::new(0),
                ))
                .await;
        }
        let usecase = GetRoomsUseCase::new(registry);

        // when (操作):
        let rooms = usecase.execute().await;

        // then (期待する結果):
        let listed: Vec<(&str, usize)> = rooms
            .iter()
            .map(|r| (r.code.as_str(), r.members.len()))
            .collect();
        assert_eq!(listed, vec![("a", 2), ("b", 1)]);
    }

    #[tokio::test]
    async fn test_no_rooms() {
        // テスト項目: 誰もいなければ空の一覧
        // given (前提条件):
        let usecase = GetRoomsUseCase::new(Arc::new(InMemoryConnectionRegistry::new()));

        // when (操作):
        let rooms = usecase.execute().await;

        // then (期待する結果):
        assert!(rooms.is_empty());
    }
}
