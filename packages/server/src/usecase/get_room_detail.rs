//! UseCase: ルーム詳細の取得
//!
//! メンバー、入力中のユーザー、履歴件数をまとめて返します。
//! メンバーのいないルームは存在しないものとして扱います。

use std::sync::Arc;

use crate::domain::{ConnectionRegistry, HistoryBuffer, PresenceTracker, RoomCode, Username};

use super::{error::QueryError, room_session::RoomStores};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDetail {
    pub code: RoomCode,
    pub members: Vec<Username>,
    pub typing: Vec<Username>,
    pub history_length: usize,
}

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    presence: Arc<dyn PresenceTracker>,
    history: Arc<dyn HistoryBuffer>,
}

impl GetRoomDetailUseCase {
    pub fn new(stores: RoomStores) -> Self {
        Self {
            registry: stores.registry,
            presence: stores.presence,
            history: stores.history,
        }
    }

    pub async fn execute(&self, room: RoomCode) -> Result<RoomDetail, QueryError> {
        let members = self.registry.members_of(&room).await;
        if members.is_empty() {
            return Err(QueryError::RoomNotFound);
        }
        let typing = self.presence.snapshot(&room).await;
        let history_length = self.history.len(&room).await;

        Ok(RoomDetail {
            code: room,
            members,
            typing,
            history_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Connection, Event, MessageContent, Timestamp},
        infrastructure::repository::{
            InMemoryConnectionRegistry, InMemoryHistoryBuffer, InMemoryPresenceTracker,
        },
    };
    use std::time::Duration;
    use tokio::time::Instant;

    fn room(code: &str) -> RoomCode {
        RoomCode::new(code.to_string()).unwrap()
    }

    fn user(name: &str) -> Username {
        Username::new(name.to_string()).unwrap()
    }

    fn stores() -> RoomStores {
        RoomStores {
            registry: Arc::new(InMemoryConnectionRegistry::new()),
            presence: Arc::new(InMemoryPresenceTracker::new()),
            history: Arc::new(InMemoryHistoryBuffer::new(50)),
        }
    }

    #[tokio::test]
    async fn test_detail_combines_all_stores() {
        // テスト項目: メンバー、入力中ユーザー、履歴件数がまとめて返る
        // given (前提条件):
        let stores = stores();
        stores
            .registry
            .register(Connection::new(user("alice"), room("X"), Timestamp::new(0)))
            .await;
        stores
            .registry
            .register(Connection::new(user("bob"), room("X"), Timestamp::new(1)))
            .await;
        stores
            .presence
            .start_typing(&room("X"), &user("bob"), Instant::now() + Duration::from_secs(1))
            .await;
        stores
            .history
            .append(
                &room("X"),
                Event::chat(
                    user("alice"),
                    MessageContent::new("hi".to_string()).unwrap(),
                    Timestamp::new(2),
                ),
            )
            .await
            .unwrap();
        let usecase = GetRoomDetailUseCase::new(stores);

        // when (操作):
        let detail = usecase.execute(room("X")).await.unwrap();

        // then (期待する結果):
        assert_eq!(detail.members, vec![user("alice"), user("bob")]);
        assert_eq!(detail.typing, vec![user("bob")]);
        assert_eq!(detail.history_length, 1);
    }

    #[tokio::test]
    async fn test_room_without_members_is_not_found() {
        // テスト項目: メンバーのいないルームは RoomNotFound
        // given (前提条件):
        let usecase = GetRoomDetailUseCase::new(stores());

        // when (操作):
        let result = usecase.execute(room("nowhere")).await;

        // then (期待する結果):
        assert_eq!(result, Err(QueryError::RoomNotFound));
    }
}
