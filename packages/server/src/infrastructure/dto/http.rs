//! HTTP API DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::ServerMessage;

/// Query parameters for opening a room connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub username: String,
}

/// Query parameters for the history endpoint
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Room summary for the list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub room_id: String,
    pub users: Vec<String>,
    pub user_count: usize,
}

/// Room detail for the detail endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub room_id: String,
    pub users: Vec<String>,
    pub user_count: usize,
    pub typing: Vec<String>,
    pub history_length: usize,
}

/// History replay response, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponseDto {
    pub room_id: String,
    pub messages: Vec<ServerMessage>,
    pub count: usize,
}

/// Upload result handed over by the file upload service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUploadedRequest {
    pub username: String,
    pub file_url: String,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
}
