//! InMemory History Buffer 実装

use std::collections::VecDeque;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::{
    config::DEFAULT_HISTORY_LIMIT,
    domain::{Event, HistoryBuffer, RepositoryError, RoomCode},
};

/// インメモリ History Buffer 実装
///
/// 各ルームの履歴は最大 `capacity` 件で、超えた分は古いものから捨てられます。
pub struct InMemoryHistoryBuffer {
    rooms: DashMap<RoomCode, VecDeque<Event>>,
    capacity: usize,
}

impl InMemoryHistoryBuffer {
    /// `capacity` is clamped to at least one entry.
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryHistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[async_trait]
impl HistoryBuffer for InMemoryHistoryBuffer {
    async fn append(&self, room: &RoomCode, event: Event) -> Result<(), RepositoryError> {
        if !event.is_history_entry() {
            return Err(RepositoryError::NotHistoryEvent(event.kind_name()));
        }

        let mut entries = self
            .rooms
            .entry(room.clone())
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(event);
        Ok(())
    }

    async fn snapshot(&self, room: &RoomCode, limit: usize) -> Vec<Event> {
        match self.rooms.get(room) {
            Some(entries) => {
                let skip = entries.len().saturating_sub(limit);
                entries.iter().skip(skip).cloned().collect()
            }
            None => Vec::new(),
        }
    }

    async fn len(&self, room: &RoomCode) -> usize {
        self.rooms.get(room).map(|entries| entries.len()).unwrap_or(0)
    }

    async fn clear(&self, room: &RoomCode) {
        self.rooms.remove(room);
    }
}
