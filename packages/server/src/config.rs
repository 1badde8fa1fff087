//! Runtime configuration of the room messaging server.

use std::{sync::Arc, time::Duration};

use thiserror::Error;

use crate::{
    domain::{RoomCode, RoomDirectory},
    infrastructure::room_directory::{OpenRoomDirectory, StaticRoomDirectory},
};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const DEFAULT_TYPING_TIMEOUT: Duration = Duration::from_millis(1500);
pub const DEFAULT_TYPING_SWEEP_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// How room codes that were never seen before are treated on join
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomPolicy {
    /// Create the room on first join
    Open,
    /// Only the listed rooms may be joined
    Registered(Vec<RoomCode>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("history limit must be at least 1")]
    ZeroHistoryLimit,
    #[error("typing timeout must be greater than zero")]
    ZeroTypingTimeout,
    #[error("typing sweep interval must be greater than zero and at most the typing timeout ({timeout:?}), got {interval:?}")]
    InvalidSweepInterval { interval: Duration, timeout: Duration },
    #[error("outbound queue capacity ({capacity}) must exceed the history limit ({history_limit})")]
    QueueTooSmall {
        capacity: usize,
        history_limit: usize,
    },
    #[error("the registered room policy needs at least one room")]
    NoRegisteredRooms,
}

/// Validated server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Max history entries kept (and replayed) per room
    pub history_limit: usize,
    /// How long a `typing_start` stays valid without a refresh
    pub typing_timeout: Duration,
    /// How often expired typing entries are swept
    pub typing_sweep_interval: Duration,
    /// Bound of each connection's outbound queue
    pub outbound_queue_capacity: usize,
    pub room_policy: RoomPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            typing_timeout: DEFAULT_TYPING_TIMEOUT,
            typing_sweep_interval: DEFAULT_TYPING_SWEEP_INTERVAL,
            outbound_queue_capacity: DEFAULT_OUTBOUND_QUEUE_CAPACITY,
            room_policy: RoomPolicy::Open,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == 0 {
            return Err(ConfigError::ZeroHistoryLimit);
        }
        if self.typing_timeout.is_zero() {
            return Err(ConfigError::ZeroTypingTimeout);
        }
        if self.typing_sweep_interval.is_zero() || self.typing_sweep_interval > self.typing_timeout
        {
            return Err(ConfigError::InvalidSweepInterval {
                interval: self.typing_sweep_interval,
                timeout: self.typing_timeout,
            });
        }
        // The whole history replay plus the join announcement must fit in a fresh queue.
        if self.outbound_queue_capacity <= self.history_limit {
            return Err(ConfigError::QueueTooSmall {
                capacity: self.outbound_queue_capacity,
                history_limit: self.history_limit,
            });
        }
        if matches!(&self.room_policy, RoomPolicy::Registered(rooms) if rooms.is_empty()) {
            return Err(ConfigError::NoRegisteredRooms);
        }
        Ok(())
    }

    /// Room directory implementing the configured policy
    pub fn room_directory(&self) -> Arc<dyn RoomDirectory> {
        match &self.room_policy {
            RoomPolicy::Open => Arc::new(OpenRoomDirectory),
            RoomPolicy::Registered(rooms) => Arc::new(StaticRoomDirectory::new(rooms.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        // テスト項目: デフォルト設定はバリデーションを通過する
        // given (前提条件):
        let config = ServerConfig::default();

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.typing_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_sweep_interval_must_not_exceed_timeout() {
        // テスト項目: スイープ間隔が入力タイムアウトより長い設定は拒否される
        // given (前提条件):
        let config = ServerConfig {
            typing_sweep_interval: Duration::from_secs(2),
            ..ServerConfig::default()
        };

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(ConfigError::InvalidSweepInterval { .. })
        ));
    }

    #[test]
    fn test_queue_must_hold_full_replay() {
        // テスト項目: 送信キューが履歴の再送分より小さい設定は拒否される
        // given (前提条件):
        let config = ServerConfig {
            outbound_queue_capacity: 50,
            ..ServerConfig::default()
        };

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ConfigError::QueueTooSmall {
                capacity: 50,
                history_limit: 50
            })
        );
    }

    #[test]
    fn test_zero_history_limit_is_rejected() {
        // テスト項目: 履歴上限 0 は拒否される
        // given (前提条件):
        let config = ServerConfig {
            history_limit: 0,
            ..ServerConfig::default()
        };

        // when (操作) / then (期待する結果):
        assert_eq!(config.validate(), Err(ConfigError::ZeroHistoryLimit));
    }

    #[test]
    fn test_registered_policy_needs_rooms() {
        // テスト項目: 登録制ポリシーでルームが 1 つもない設定は拒否される
        // given (前提条件):
        let config = ServerConfig {
            room_policy: RoomPolicy::Registered(vec![]),
            ..ServerConfig::default()
        };

        // when (操作) / then (期待する結果):
        assert_eq!(config.validate(), Err(ConfigError::NoRegisteredRooms));
    }

    #[tokio::test]
    async fn test_room_directory_follows_policy() {
        // テスト項目: 設定したポリシーに応じたルームディレクトリが作られる
        // given (前提条件):
        let math = RoomCode::new("MATH-101".to_string()).unwrap();
        let other = RoomCode::new("PHYS-201".to_string()).unwrap();
        let open = ServerConfig::default();
        let registered = ServerConfig {
            room_policy: RoomPolicy::Registered(vec![math.clone()]),
            ..ServerConfig::default()
        };

        // when (操作):
        let open_directory = open.room_directory();
        let registered_directory = registered.room_directory();

        // then (期待する結果):
        assert!(open_directory.admit(&other).await);
        assert!(registered_directory.admit(&math).await);
        assert!(!registered_directory.admit(&other).await);
    }
}
