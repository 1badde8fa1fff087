//! UseCase: 履歴の取得
//!
//! HTTP の履歴エンドポイントから使われます。存在しないルームの履歴は空です。

use std::sync::Arc;

use crate::domain::{Event, HistoryBuffer, RoomCode};

/// ルーム履歴取得のユースケース
pub struct GetHistoryUseCase {
    history: Arc<dyn HistoryBuffer>,
    default_limit: usize,
}

impl GetHistoryUseCase {
    pub fn new(history: Arc<dyn HistoryBuffer>, default_limit: usize) -> Self {
        Self {
            history,
            default_limit,
        }
    }

    /// Most recent `limit` entries (default: the configured history limit), oldest first
    pub async fn execute(&self, room: &RoomCode, limit: Option<usize>) -> Vec<Event> {
        let limit = limit.unwrap_or(self.default_limit);
        self.history.snapshot(room, limit).await
    }
}
