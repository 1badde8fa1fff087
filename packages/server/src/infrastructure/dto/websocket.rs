//! WebSocket message DTOs.
//!
//! Every frame is a flat JSON record with a `type` discriminator.

use serde::{Deserialize, Serialize};

/// Frame sent by the server to a connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Join {
        username: String,
        timestamp: i64,
        message: String,
        room_users: Vec<String>,
    },
    Leave {
        username: String,
        timestamp: i64,
        message: String,
        room_users: Vec<String>,
    },
    Chat {
        username: String,
        timestamp: i64,
        content: String,
    },
    File {
        username: String,
        timestamp: i64,
        file_url: String,
        file_name: String,
        file_size: u64,
        file_type: String,
    },
    TypingStart {
        username: String,
        timestamp: i64,
    },
    TypingStop {
        username: String,
        timestamp: i64,
    },
    Error {
        username: String,
        timestamp: i64,
        error_code: String,
        severity: String,
        message: String,
    },
}

/// Frame sent by a client.
///
/// Client-supplied `username` and `timestamp` fields are ignored; the server
/// uses the connection's username and assigns its own timestamps.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    #[serde(alias = "message")]
    Chat { content: String },
    File {
        file_url: String,
        file_name: String,
        file_size: u64,
        file_type: String,
    },
    TypingStart,
    TypingStop,
}
