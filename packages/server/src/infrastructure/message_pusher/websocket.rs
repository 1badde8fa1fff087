//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの送信キュー（`mpsc::Sender`）を管理
//! - イベントを JSON フレームにエンコードし、クライアントへ送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された送信キューを受け取り、メッセージ送信に使用します。
//! 送信は `try_send` で行い、遅いクライアントがルーム全体を待たせることはありません。
//! キューが満杯・切断済みの接続は失敗として報告され、呼び出し側が退室処理を行います。

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc::error::TrySendError;

use crate::{
    domain::{BroadcastReport, ConnectionId, Event, MessagePushError, MessagePusher, PusherChannel},
    infrastructure::dto::conversion::encode_event,
};

/// WebSocket を使った MessagePusher 実装
///
/// Key: connection handle, Value: outbound queue of that connection
#[derive(Default)]
pub struct WebSocketMessagePusher {
    clients: DashMap<ConnectionId, PusherChannel>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_push(
        sender: &PusherChannel,
        connection_id: &ConnectionId,
        frame: &str,
    ) -> Result<(), MessagePushError> {
        sender.try_send(frame.to_string()).map_err(|e| match e {
            TrySendError::Full(_) => MessagePushError::QueueFull(*connection_id),
            TrySendError::Closed(_) => MessagePushError::Closed(*connection_id),
        })
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        self.clients.insert(connection_id, sender);
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        if self.clients.remove(connection_id).is_some() {
            tracing::debug!(
                "Connection '{}' unregistered from MessagePusher",
                connection_id
            );
        }
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &Event,
    ) -> Result<(), MessagePushError> {
        let frame = encode_event(event).map_err(|e| MessagePushError::Encode(e.to_string()))?;
        let sender = self
            .clients
            .get(connection_id)
            .ok_or(MessagePushError::ConnectionNotFound(*connection_id))?;
        Self::try_push(&sender, connection_id, &frame)
    }

    async fn broadcast(&self, targets: &[ConnectionId], event: &Event) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let frame = match encode_event(event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Failed to encode '{}' event: {}", event.kind_name(), e);
                return report;
            }
        };

        for target in targets {
            let result = match self.clients.get(target) {
                Some(sender) => Self::try_push(&sender, target, &frame),
                None => Err(MessagePushError::ConnectionNotFound(*target)),
            };
            // ブロードキャストでは一部の送信失敗を許容し、残りへの配信を続ける
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!("Failed to push '{}' event: {}", event.kind_name(), e);
                    report.failed.push(*target);
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageContent, Timestamp, Username};
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - push_to: 特定の接続への送信
    // - broadcast: 複数接続への送信と部分失敗の報告
    // - キュー満杯・切断済みの接続が失敗として扱われること
    // ========================================

    fn chat(text: &str) -> Event {
        Event::chat(
            Username::new("alice".to_string()).unwrap(),
            MessageContent::new(text.to_string()).unwrap(),
            Timestamp::new(1000),
        )
    }

    fn content_of(frame: Option<String>) -> String {
        let json: serde_json::Value = serde_json::from_str(&frame.unwrap()).unwrap();
        json["content"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_push_to_success() {
        // テスト項目: 特定の接続にイベントを JSON で送信できる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, mut rx) = mpsc::channel(8);
        let id = ConnectionId::generate();
        pusher.register_client(id, tx).await;

        // when (操作):
        let result = pusher.push_to(&id, &chat("Hello")).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(content_of(rx.recv().await), "Hello");
    }

    #[tokio::test]
    async fn test_push_to_unknown_connection() {
        // テスト項目: 未登録の接続への送信はエラーを返す
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let id = ConnectionId::generate();

        // when (操作):
        let result = pusher.push_to(&id, &chat("Hello")).await;

        // then (期待する結果):
        assert_eq!(result, Err(MessagePushError::ConnectionNotFound(id)));
    }

    #[tokio::test]
    async fn test_broadcast_success() {
        // テスト項目: 複数の接続にイベントをブロードキャストできる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        let alice = ConnectionId::generate();
        let bob = ConnectionId::generate();
        pusher.register_client(alice, tx1).await;
        pusher.register_client(bob, tx2).await;

        // when (操作):
        let report = pusher.broadcast(&[alice, bob], &chat("Broadcast")).await;

        // then (期待する結果):
        assert_eq!(report.delivered, 2);
        assert!(report.failed.is_empty());
        assert_eq!(content_of(rx1.recv().await), "Broadcast");
        assert_eq!(content_of(rx2.recv().await), "Broadcast");
    }

    #[tokio::test]
    async fn test_broadcast_partial_failure() {
        // テスト項目: 一部の接続が切断済み・キュー満杯でも残りには届き、失敗が報告される
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx_ok, mut rx_ok) = mpsc::channel(8);
        let (tx_closed, rx_closed) = mpsc::channel(8);
        let (tx_full, _rx_full) = mpsc::channel(1);
        let ok = ConnectionId::generate();
        let closed = ConnectionId::generate();
        let full = ConnectionId::generate();
        pusher.register_client(closed, tx_closed).await;
        pusher.register_client(full, tx_full).await;
        pusher.register_client(ok, tx_ok).await;
        drop(rx_closed);
        pusher.push_to(&full, &chat("filler")).await.unwrap();

        // when (操作):
        let report = pusher
            .broadcast(&[closed, full, ok], &chat("Broadcast"))
            .await;

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, vec![closed, full]);
        assert_eq!(content_of(rx_ok.recv().await), "Broadcast");
    }

    #[tokio::test]
    async fn test_unregister_drops_queue() {
        // テスト項目: 登録解除すると送信キューが閉じられる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, mut rx) = mpsc::channel(8);
        let id = ConnectionId::generate();
        pusher.register_client(id, tx).await;

        // when (操作):
        pusher.unregister_client(&id).await;

        // then (期待する結果):
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_broadcast_empty_targets() {
        // テスト項目: 空のターゲットリストでもエラーにならない
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();

        // when (操作):
        let report = pusher.broadcast(&[], &chat("Message")).await;

        // then (期待する結果):
        assert_eq!(report, BroadcastReport::default());
    }
}
