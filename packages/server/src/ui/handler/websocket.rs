//! WebSocket connection handlers.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ClientCommand, Connection, RoomCode, Username},
    infrastructure::dto::{http::ConnectQuery, websocket::ClientMessage},
    ui::state::AppState,
    usecase::SessionError,
};

/// How long queued frames may take to flush after the connection left its room
const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_code): Path<String>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> Domain Model
    let room = match RoomCode::try_from(room_code) {
        Ok(room) => room,
        Err(e) => {
            tracing::warn!("Invalid room code: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };
    let username = match Username::try_from(query.username) {
        Ok(username) => username,
        Err(e) => {
            tracing::warn!("Invalid username for room '{}': {}", room, e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    if !state.session_manager.admits(&room).await {
        tracing::warn!("Rejected connection of '{}' to unknown room '{}'", username, room);
        return Err(StatusCode::NOT_FOUND);
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, room, username)))
}

/// Spawns a task that forwards the connection's outbound queue to the WebSocket.
///
/// The queue closes once the session manager drops the connection (explicit or
/// implicit leave); the socket is then closed.
fn pusher_loop(
    mut rx: mpsc::Receiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    })
}

/// Parse and route one text frame.
async fn dispatch_text(
    state: &AppState,
    connection: &Connection,
    text: &str,
) -> Result<(), SessionError> {
    let message: ClientMessage = serde_json::from_str(text)?;
    let command = ClientCommand::try_from(message)?;
    state.session_manager.handle(connection, command).await
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, room: RoomCode, username: Username) {
    let (tx, rx) = mpsc::channel(state.outbound_queue_capacity);

    // History replay and the join announcement are queued on `tx` here.
    let connection = match state.session_manager.join(room, username, tx).await {
        Ok(connection) => connection,
        Err(e) => {
            tracing::warn!("Join failed: {}", e);
            return;
        }
    };

    let (sender, mut receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);

    let recv_state = state.clone();
    let recv_connection = connection.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!(
                        "WebSocket error on '{}': {}",
                        recv_connection.username,
                        e
                    );
                    break;
                }
            };

            let result = match msg {
                Message::Text(text) => {
                    dispatch_text(&recv_state, &recv_connection, text.as_str()).await
                }
                Message::Binary(_) => Err(SessionError::Validation(
                    "binary frames are not supported".to_string(),
                )),
                Message::Close(_) => {
                    tracing::debug!("'{}' requested close", recv_connection.username);
                    break;
                }
                // Ping/pong is handled by the WebSocket protocol
                _ => Ok(()),
            };

            if let Err(e) = result {
                recv_state
                    .session_manager
                    .reject(&recv_connection, &e)
                    .await;
                if e.is_fatal() {
                    break;
                }
            }
        }
    });

    let send_finished = tokio::select! {
        _ = &mut recv_task => false,
        _ = &mut send_task => {
            recv_task.abort();
            true
        },
    };

    state.session_manager.leave(&connection).await;

    // Leaving closed the outbound queue; let the pusher flush what is left.
    if !send_finished && tokio::time::timeout(FLUSH_TIMEOUT, &mut send_task).await.is_err() {
        send_task.abort();
    }
}
