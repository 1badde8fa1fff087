//! MessagePusher trait 定義
//!
//! 接続中のクライアントへイベントを届けるためのインターフェース。
//! ワイヤ形式へのエンコードは実装側の責務です。
//! 送信キューは接続ごとに上限付きで、満杯の場合は送信失敗として扱います。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, Event, MessagePushError};

/// Outbound queue of one connection (serialized JSON frames)
pub type PusherChannel = mpsc::Sender<String>;

/// Outcome of a fan-out
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Number of connections the frame was queued for
    pub delivered: usize,
    /// Connections whose send failed; the caller turns these into leaves
    pub failed: Vec<ConnectionId>,
}

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Attach the outbound queue of a connection
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// Detach (and drop) the outbound queue of a connection
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// Queue an event for a single connection
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &Event,
    ) -> Result<(), MessagePushError>;

    /// Queue an event for every target. Never fails as a whole: per-target
    /// failures are collected in the report.
    async fn broadcast(&self, targets: &[ConnectionId], event: &Event) -> BroadcastReport;
}
