//! Broadcast Dispatcher
//!
//! ルームの現在のメンバー全員へイベントを配信します。配信先はレジストリから
//! 呼び出し時点で取得し、送信に失敗した接続は呼び出し側に返します。
//! 失敗した接続の退室処理は `RoomSessionManager` が行います。

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, Event, MessagePusher, RoomCode};

pub struct BroadcastDispatcher {
    registry: Arc<dyn ConnectionRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl BroadcastDispatcher {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// Deliver `event` to every connection currently registered in `room`.
    ///
    /// Returns the connections whose send failed. Never fails as a whole.
    pub async fn broadcast(&self, room: &RoomCode, event: &Event) -> Vec<ConnectionId> {
        let targets = self.registry.connections_of(room).await;
        let report = self.message_pusher.broadcast(&targets, event).await;
        tracing::debug!(
            "Broadcasted '{}' from '{}' in room '{}' to {}/{} connections",
            event.kind_name(),
            event.username,
            room,
            report.delivered,
            targets.len()
        );
        report.failed
    }
}
