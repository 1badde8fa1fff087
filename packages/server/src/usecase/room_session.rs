//! Room Session Manager
//!
//! 接続の入室・発言・退室を扱う唯一の入口です。
//!
//! ## 直列化
//!
//! ルームごとに `RoomSession` を 1 つ持ち、そのルームへの全操作（入室、イベント処理、
//! 退室、入力状態の失効）はこのセッションの `Mutex` を保持したまま行われます。
//! これにより、履歴への追加順と全メンバーへの配信順が常に一致します。
//! 異なるルームのセッションは独立しているため、互いを待たせることはありません。
//!
//! ## 入室時の順序
//!
//! 1. 送信キューを登録（この時点ではレジストリ未登録なので配信対象外）
//! 2. 履歴を新しい接続へ再送
//! 3. レジストリへ登録（ここから配信対象）
//! 4. join をルーム全員へ配信
//!
//! セッションのロックを保持しているので、2 と 3 の間に他の発言が割り込むことはありません。

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use dashmap::DashMap;
use dropzone_shared::time::Clock;
use tokio::{
    sync::{Mutex, OwnedMutexGuard},
    time::Instant,
};

use crate::{
    config::{DEFAULT_HISTORY_LIMIT, DEFAULT_TYPING_TIMEOUT},
    domain::{
        ClientCommand, Connection, ConnectionId, ConnectionRegistry, Event, EventKind, FileRef,
        HistoryBuffer, MessagePusher, PresenceTracker, PusherChannel, RoomCode, RoomDirectory,
        Timestamp, Username,
    },
};

use super::{broadcast::BroadcastDispatcher, error::SessionError};

/// The three per-room stores the session manager orchestrates
#[derive(Clone)]
pub struct RoomStores {
    pub registry: Arc<dyn ConnectionRegistry>,
    pub presence: Arc<dyn PresenceTracker>,
    pub history: Arc<dyn HistoryBuffer>,
}

/// Tunables of the session manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Number of history entries replayed to a new connection
    pub replay_limit: usize,
    /// Lifetime of a `typing_start` without refresh
    pub typing_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            replay_limit: DEFAULT_HISTORY_LIMIT,
            typing_timeout: DEFAULT_TYPING_TIMEOUT,
        }
    }
}

/// Lifecycle of a connection as seen by the session manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Receiving the history replay; not yet a broadcast target
    Connecting,
    Joined,
    /// Terminal
    Closed,
}

struct SessionEntry {
    connection: Connection,
    state: ConnectionState,
}

/// Serialized state of one room
struct RoomSession {
    code: RoomCode,
    connections: HashMap<ConnectionId, SessionEntry>,
    last_timestamp: i64,
    /// Set once the room is destroyed; holders of a stale handle must look it up again
    closed: bool,
}

impl RoomSession {
    fn new(code: RoomCode) -> Self {
        Self {
            code,
            connections: HashMap::new(),
            last_timestamp: i64::MIN,
            closed: false,
        }
    }

    /// Server-assigned timestamps are strictly increasing within a room.
    fn next_timestamp(&mut self, now_millis: i64) -> Timestamp {
        let next = now_millis.max(self.last_timestamp.saturating_add(1));
        self.last_timestamp = next;
        Timestamp::new(next)
    }

    fn is_joined(&self, connection_id: &ConnectionId) -> bool {
        matches!(
            self.connections.get(connection_id),
            Some(SessionEntry {
                state: ConnectionState::Joined,
                ..
            })
        )
    }
}

type SessionHandle = Arc<Mutex<RoomSession>>;

pub struct RoomSessionManager {
    stores: RoomStores,
    message_pusher: Arc<dyn MessagePusher>,
    dispatcher: BroadcastDispatcher,
    directory: Arc<dyn RoomDirectory>,
    clock: Arc<dyn Clock>,
    settings: SessionSettings,
    sessions: DashMap<RoomCode, SessionHandle>,
}

impl RoomSessionManager {
    pub fn new(
        stores: RoomStores,
        message_pusher: Arc<dyn MessagePusher>,
        directory: Arc<dyn RoomDirectory>,
        clock: Arc<dyn Clock>,
        settings: SessionSettings,
    ) -> Self {
        let dispatcher = BroadcastDispatcher::new(stores.registry.clone(), message_pusher.clone());
        Self {
            stores,
            message_pusher,
            dispatcher,
            directory,
            clock,
            settings,
            sessions: DashMap::new(),
        }
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Ask the room directory whether `room` may be joined
    pub async fn admits(&self, room: &RoomCode) -> bool {
        self.directory.admit(room).await
    }

    /// Join `room` as `username`, delivering frames through `outbound`.
    ///
    /// The history replay is queued on `outbound` before the connection can
    /// receive any live broadcast, and before the `join` announcement.
    pub async fn join(
        &self,
        room: RoomCode,
        username: Username,
        outbound: PusherChannel,
    ) -> Result<Connection, SessionError> {
        if !self.directory.admit(&room).await {
            tracing::warn!("Room '{}' rejected by the room directory", room);
            return Err(SessionError::RoomRejected(room));
        }

        let (handle, mut session) = self.lock_or_create(&room).await;
        let joined_at = session.next_timestamp(self.clock.now_millis());
        let connection = Connection::new(username, room, joined_at);
        session.connections.insert(
            connection.id,
            SessionEntry {
                connection: connection.clone(),
                state: ConnectionState::Connecting,
            },
        );
        self.message_pusher
            .register_client(connection.id, outbound)
            .await;

        let replay = self
            .stores
            .history
            .snapshot(&connection.room, self.settings.replay_limit)
            .await;
        for event in &replay {
            if let Err(e) = self.message_pusher.push_to(&connection.id, event).await {
                tracing::warn!(
                    "History replay to '{}' in room '{}' failed: {}",
                    connection.username,
                    connection.room,
                    e
                );
                session.connections.remove(&connection.id);
                self.message_pusher.unregister_client(&connection.id).await;
                self.close_if_empty(&handle, &mut session).await;
                return Err(SessionError::Transport(e));
            }
        }

        let room_users = self.stores.registry.register(connection.clone()).await;
        if let Some(entry) = session.connections.get_mut(&connection.id) {
            entry.state = ConnectionState::Joined;
        }
        tracing::info!(
            "'{}' joined room '{}' ({} members, {} history entries replayed)",
            connection.username,
            connection.room,
            room_users.len(),
            replay.len()
        );

        let timestamp = session.next_timestamp(self.clock.now_millis());
        let event = Event::new(
            EventKind::Join { room_users },
            connection.username.clone(),
            timestamp,
        );
        self.broadcast(&mut session, &event).await;
        self.close_if_empty(&handle, &mut session).await;

        Ok(connection)
    }

    /// Route one validated command from a joined connection.
    pub async fn handle(
        &self,
        connection: &Connection,
        command: ClientCommand,
    ) -> Result<(), SessionError> {
        let Some((handle, mut session)) = self.lock_existing(&connection.room).await else {
            return Err(SessionError::NotJoined(connection.id));
        };
        if !session.is_joined(&connection.id) {
            return Err(SessionError::NotJoined(connection.id));
        }

        let result = self
            .dispatch_command(&mut session, &connection.username, command)
            .await;
        self.close_if_empty(&handle, &mut session).await;
        result
    }

    /// Publish an upload result on behalf of `username` into an existing room.
    ///
    /// The uploader needs no live connection, but the room must currently have
    /// members. Returns `false` when it has none.
    pub async fn publish_file(
        &self,
        room: &RoomCode,
        username: Username,
        file: FileRef,
    ) -> Result<bool, SessionError> {
        let Some((handle, mut session)) = self.lock_existing(room).await else {
            return Ok(false);
        };
        let result = self
            .dispatch_command(&mut session, &username, ClientCommand::File(file))
            .await;
        self.close_if_empty(&handle, &mut session).await;
        result.map(|()| true)
    }

    /// Report `error` to the affected connection only.
    pub async fn reject(&self, connection: &Connection, error: &SessionError) {
        let now = self.clock.now_millis();
        let timestamp = match self.lock_existing(&connection.room).await {
            Some((_, mut session)) => session.next_timestamp(now),
            None => Timestamp::new(now),
        };
        let event = Event::new(
            EventKind::Error {
                code: error.code(),
                severity: error.severity(),
                message: error.to_string(),
            },
            connection.username.clone(),
            timestamp,
        );

        if error.is_fatal() {
            tracing::error!(
                "Closing connection '{}' of '{}' in room '{}': {}",
                connection.id,
                connection.username,
                connection.room,
                error
            );
        } else {
            tracing::debug!(
                "Rejected message from '{}' in room '{}': {}",
                connection.username,
                connection.room,
                error
            );
        }

        if let Err(e) = self.message_pusher.push_to(&connection.id, &event).await {
            tracing::warn!("Failed to report error to '{}': {}", connection.username, e);
        }
    }

    /// Remove a connection from its room. Returns `false` if it had already left.
    pub async fn leave(&self, connection: &Connection) -> bool {
        let Some((handle, mut session)) = self.lock_existing(&connection.room).await else {
            return false;
        };
        let Some(entry) = session.connections.remove(&connection.id) else {
            return false;
        };

        let failed = self.depart(&mut session, &entry.connection).await;
        self.settle(&mut session, failed).await;
        self.close_if_empty(&handle, &mut session).await;
        true
    }

    /// Expire typing entries whose deadline is at or before `now`, broadcasting
    /// a `typing_stop` for each. Returns the number of expired entries.
    pub async fn expire_typing(&self, now: Instant) -> usize {
        let mut expired_total = 0;

        for room in self.stores.presence.rooms().await {
            let Some((handle, mut session)) = self.lock_existing(&room).await else {
                continue;
            };
            let expired = self.stores.presence.take_expired(&room, now).await;
            for username in expired {
                tracing::debug!("Typing of '{}' in room '{}' expired", username, room);
                let timestamp = session.next_timestamp(self.clock.now_millis());
                let event = Event::new(EventKind::TypingStop, username, timestamp);
                self.broadcast(&mut session, &event).await;
                expired_total += 1;
            }
            self.close_if_empty(&handle, &mut session).await;
        }

        expired_total
    }

    /// Current lifecycle state of a connection
    pub async fn state_of(&self, connection: &Connection) -> ConnectionState {
        match self.lock_existing(&connection.room).await {
            Some((_, session)) => session
                .connections
                .get(&connection.id)
                .map(|entry| entry.state)
                .unwrap_or(ConnectionState::Closed),
            None => ConnectionState::Closed,
        }
    }

    /// Number of rooms with a live session
    pub fn active_rooms(&self) -> usize {
        self.sessions.len()
    }

    async fn dispatch_command(
        &self,
        session: &mut RoomSession,
        username: &Username,
        command: ClientCommand,
    ) -> Result<(), SessionError> {
        let room = session.code.clone();
        match command {
            ClientCommand::Chat(content) => {
                let timestamp = session.next_timestamp(self.clock.now_millis());
                let event = Event::chat(username.clone(), content, timestamp);
                self.stores.history.append(&room, event.clone()).await?;
                self.broadcast(session, &event).await;
            }
            ClientCommand::File(file) => {
                let timestamp = session.next_timestamp(self.clock.now_millis());
                let event = Event::file(username.clone(), file, timestamp);
                self.stores.history.append(&room, event.clone()).await?;
                self.broadcast(session, &event).await;
            }
            ClientCommand::TypingStart => {
                let deadline = Instant::now() + self.settings.typing_timeout;
                if self
                    .stores
                    .presence
                    .start_typing(&room, username, deadline)
                    .await
                {
                    let timestamp = session.next_timestamp(self.clock.now_millis());
                    let event = Event::new(EventKind::TypingStart, username.clone(), timestamp);
                    self.broadcast(session, &event).await;
                }
            }
            ClientCommand::TypingStop => {
                if self.stores.presence.stop_typing(&room, username).await {
                    let timestamp = session.next_timestamp(self.clock.now_millis());
                    let event = Event::new(EventKind::TypingStop, username.clone(), timestamp);
                    self.broadcast(session, &event).await;
                }
            }
        }
        Ok(())
    }

    /// Broadcast and turn every failed send into an implicit leave.
    async fn broadcast(&self, session: &mut RoomSession, event: &Event) {
        let failed = self.dispatcher.broadcast(&session.code, event).await;
        self.settle(session, failed).await;
    }

    /// Process implicit leaves until no announcement fails any more.
    async fn settle(&self, session: &mut RoomSession, failed: Vec<ConnectionId>) {
        let mut pending: VecDeque<ConnectionId> = failed.into();
        while let Some(connection_id) = pending.pop_front() {
            let Some(entry) = session.connections.remove(&connection_id) else {
                continue;
            };
            tracing::info!(
                "Dropping unreachable connection of '{}' in room '{}'",
                entry.connection.username,
                session.code
            );
            pending.extend(self.depart(session, &entry.connection).await);
        }
    }

    /// Deregister a connection and announce its departure. The caller has
    /// already removed it from the session. Returns failed sends.
    async fn depart(&self, session: &mut RoomSession, connection: &Connection) -> Vec<ConnectionId> {
        self.message_pusher
            .unregister_client(&connection.id)
            .await;

        let Some(room_users) = self
            .stores
            .registry
            .deregister(&connection.room, &connection.id)
            .await
        else {
            // Never made it past the history replay; nobody saw it join.
            return Vec::new();
        };
        tracing::info!(
            "'{}' left room '{}' ({} members remaining)",
            connection.username,
            connection.room,
            room_users.len()
        );

        let mut failed = Vec::new();
        if self
            .stores
            .presence
            .stop_typing(&connection.room, &connection.username)
            .await
        {
            let timestamp = session.next_timestamp(self.clock.now_millis());
            let event = Event::new(EventKind::TypingStop, connection.username.clone(), timestamp);
            failed.extend(self.dispatcher.broadcast(&session.code, &event).await);
        }

        let timestamp = session.next_timestamp(self.clock.now_millis());
        let event = Event::new(
            EventKind::Leave { room_users },
            connection.username.clone(),
            timestamp,
        );
        failed.extend(self.dispatcher.broadcast(&session.code, &event).await);
        failed
    }

    /// Destroy the room once its last connection is gone.
    async fn close_if_empty(&self, handle: &SessionHandle, session: &mut RoomSession) {
        if session.closed || !session.connections.is_empty() {
            return;
        }
        session.closed = true;
        self.stores.presence.clear(&session.code).await;
        self.stores.history.clear(&session.code).await;
        self.sessions
            .remove_if(&session.code, |_, current| Arc::ptr_eq(current, handle));
        tracing::info!("Room '{}' is empty and was destroyed", session.code);
    }

    async fn lock_or_create(&self, room: &RoomCode) -> (SessionHandle, OwnedMutexGuard<RoomSession>) {
        loop {
            let handle = self
                .sessions
                .entry(room.clone())
                .or_insert_with(|| Arc::new(Mutex::new(RoomSession::new(room.clone()))))
                .value()
                .clone();
            let session = handle.clone().lock_owned().await;
            if !session.closed {
                return (handle, session);
            }
        }
    }

    async fn lock_existing(
        &self,
        room: &RoomCode,
    ) -> Option<(SessionHandle, OwnedMutexGuard<RoomSession>)> {
        loop {
            let handle = self.sessions.get(room)?.value().clone();
            let session = handle.clone().lock_owned().await;
            if !session.closed {
                return Some((handle, session));
            }
        }
    }
}
