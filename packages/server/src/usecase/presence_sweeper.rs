//! Presence Sweeper
//!
//! 一定間隔で `RoomSessionManager::expire_typing` を呼び、`typing_stop` が
//! 送られないまま期限切れになった入力状態を取り除きます。
//! 失効は最大で 1 間隔ぶん遅れることがあります。

use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use super::room_session::RoomSessionManager;

pub struct PresenceSweeper {
    manager: Arc<RoomSessionManager>,
    interval: Duration,
}

impl PresenceSweeper {
    pub fn new(manager: Arc<RoomSessionManager>, interval: Duration) -> Self {
        Self { manager, interval }
    }

    /// Run the sweep loop on its own task until the handle is aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!("Presence sweeper started (interval: {:?})", self.interval);

            loop {
                ticker.tick().await;
                let expired = self.manager.expire_typing(Instant::now()).await;
                if expired > 0 {
                    tracing::debug!("Presence sweep expired {} typing entries", expired);
                }
            }
        })
    }
}
