//! InMemory Presence Tracker 実装

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::domain::{PresenceTracker, RoomCode, Username};

/// インメモリ Presence Tracker 実装
///
/// Key: room code, Value: typing username → expiry deadline.
/// Rooms without typing users hold no entry.
#[derive(Default)]
pub struct InMemoryPresenceTracker {
    rooms: DashMap<RoomCode, HashMap<Username, Instant>>,
}

impl InMemoryPresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PresenceTracker for InMemoryPresenceTracker {
    async fn start_typing(&self, room: &RoomCode, username: &Username, deadline: Instant) -> bool {
        let mut entry = self.rooms.entry(room.clone()).or_default();
        entry.insert(username.clone(), deadline).is_none()
    }

    async fn stop_typing(&self, room: &RoomCode, username: &Username) -> bool {
        let removed = match self.rooms.get_mut(room) {
            Some(mut entry) => entry.remove(username).is_some(),
            None => false,
        };
        if removed {
            self.rooms.remove_if(room, |_, typing| typing.is_empty());
        }
        removed
    }

    async fn snapshot(&self, room: &RoomCode) -> Vec<Username> {
        let mut typing: Vec<Username> = self
            .rooms
            .get(room)
            .map(|entry| entry.keys().cloned().collect())
            .unwrap_or_default();
        typing.sort();
        typing
    }

    async fn take_expired(&self, room: &RoomCode, now: Instant) -> Vec<Username> {
        let mut expired = match self.rooms.get_mut(room) {
            Some(mut entry) => {
                let expired: Vec<Username> = entry
                    .iter()
                    .filter(|(_, deadline)| **deadline <= now)
                    .map(|(username, _)| username.clone())
                    .collect();
                for username in &expired {
                    entry.remove(username);
                }
                expired
            }
            None => return Vec::new(),
        };
        self.rooms.remove_if(room, |_, typing| typing.is_empty());
        expired.sort();
        expired
    }

    async fn rooms(&self) -> Vec<RoomCode> {
        self.rooms.iter().map(|entry| entry.key().clone()).collect()
    }

    async fn clear(&self, room: &RoomCode) {
        self.rooms.remove(room);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn room(code: &str) -> RoomCode {
        RoomCode::new(code.to_string()).unwrap()
    }

    fn user(name: &str) -> Username {
        Username::new(name.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_start_typing_reports_transition_only_once() {
        // テスト項目: 入力開始の遷移は最初の 1 回だけ true になり、再送は期限の更新のみ
        // given (前提条件):
        let tracker = InMemoryPresenceTracker::new();
        let now = Instant::now();

        // when (操作):
        let first = tracker
            .start_typing(&room("X"), &user("eve"), now + Duration::from_millis(1500))
            .await;
        let refresh = tracker
            .start_typing(&room("X"), &user("eve"), now + Duration::from_millis(2000))
            .await;

        // then (期待する結果):
        assert!(first);
        assert!(!refresh);
        assert_eq!(tracker.snapshot(&room("X")).await, vec![user("eve")]);
    }

    #[tokio::test]
    async fn test_refresh_extends_deadline() {
        // テスト項目: 再送で期限が延長され、古い期限では失効しない
        // given (前提条件):
        let tracker = InMemoryPresenceTracker::new();
        let now = Instant::now();
        tracker
            .start_typing(&room("X"), &user("eve"), now + Duration::from_millis(1500))
            .await;
        tracker
            .start_typing(&room("X"), &user("eve"), now + Duration::from_millis(2000))
            .await;

        // when (操作):
        let at_old_deadline = tracker
            .take_expired(&room("X"), now + Duration::from_millis(1600))
            .await;
        let at_new_deadline = tracker
            .take_expired(&room("X"), now + Duration::from_millis(2000))
            .await;

        // then (期待する結果):
        assert!(at_old_deadline.is_empty());
        assert_eq!(at_new_deadline, vec![user("eve")]);
        assert!(tracker.rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_stop_typing_reports_presence() {
        // テスト項目: 入力中のユーザーを止めると true、入力中でなければ false
        // given (前提条件):
        let tracker = InMemoryPresenceTracker::new();
        let deadline = Instant::now() + Duration::from_secs(1);
        tracker.start_typing(&room("X"), &user("eve"), deadline).await;

        // when (操作):
        let first = tracker.stop_typing(&room("X"), &user("eve")).await;
        let second = tracker.stop_typing(&room("X"), &user("eve")).await;

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert!(tracker.snapshot(&room("X")).await.is_empty());
    }

    #[tokio::test]
    async fn test_take_expired_keeps_live_entries() {
        // テスト項目: 期限切れのエントリだけが取り除かれる
        // given (前提条件):
        let tracker = InMemoryPresenceTracker::new();
        let now = Instant::now();
        tracker
            .start_typing(&room("X"), &user("bob"), now + Duration::from_millis(100))
            .await;
        tracker
            .start_typing(&room("X"), &user("alice"), now + Duration::from_millis(100))
            .await;
        tracker
            .start_typing(&room("X"), &user("carol"), now + Duration::from_secs(5))
            .await;

        // when (操作):
        let expired = tracker
            .take_expired(&room("X"), now + Duration::from_millis(200))
            .await;

        // then (期待する結果):
        assert_eq!(expired, vec![user("alice"), user("bob")]);
        assert_eq!(tracker.snapshot(&room("X")).await, vec![user("carol")]);
    }

    #[tokio::test]
    async fn test_clear_forgets_room() {
        // テスト項目: clear でルームの入力状態が全て消える
        // given (前提条件):
        let tracker = InMemoryPresenceTracker::new();
        let deadline = Instant::now() + Duration::from_secs(1);
        tracker.start_typing(&room("X"), &user("eve"), deadline).await;
        tracker.start_typing(&room("Y"), &user("eve"), deadline).await;

        // when (操作):
        tracker.clear(&room("X")).await;

        // then (期待する結果):
        assert!(tracker.snapshot(&room("X")).await.is_empty());
        assert_eq!(tracker.rooms().await, vec![room("Y")]);
    }
}
