//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    domain::RoomCode,
    infrastructure::dto::{
        http::{
            FileUploadedRequest, HistoryQuery, HistoryResponseDto, RoomDetailDto, RoomSummaryDto,
        },
        websocket::ServerMessage,
    },
    ui::state::AppState,
    usecase::QueryError,
};

fn parse_room(room_code: String) -> Result<RoomCode, StatusCode> {
    RoomCode::try_from(room_code).map_err(|e| {
        tracing::warn!("Invalid room code: {}", e);
        StatusCode::BAD_REQUEST
    })
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of active rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.get_rooms_usecase.execute().await;

    // Domain Model から DTO への変換
    let room_summaries: Vec<RoomSummaryDto> = rooms
        .into_iter()
        .map(|room| RoomSummaryDto {
            room_id: room.code.into_string(),
            user_count: room.members.len(),
            users: room.members.into_iter().map(|u| u.into_string()).collect(),
        })
        .collect();

    Json(room_summaries)
}

/// Get room detail by code
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_code): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let room = parse_room(room_code)?;
    match state.get_room_detail_usecase.execute(room).await {
        Ok(detail) => {
            // Domain Model から DTO への変換
            let room_detail = RoomDetailDto {
                room_id: detail.code.into_string(),
                user_count: detail.members.len(),
                users: detail.members.into_iter().map(|u| u.into_string()).collect(),
                typing: detail.typing.into_iter().map(|u| u.into_string()).collect(),
                history_length: detail.history_length,
            };
            Ok(Json(room_detail))
        }
        Err(QueryError::RoomNotFound) => Err(StatusCode::NOT_FOUND),
    }
}

/// Get the most recent history of a room, oldest first
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(room_code): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponseDto>, StatusCode> {
    let room = parse_room(room_code)?;
    let events = state.get_history_usecase.execute(&room, query.limit).await;

    let messages: Vec<ServerMessage> = events.iter().map(ServerMessage::from).collect();
    Ok(Json(HistoryResponseDto {
        room_id: room.into_string(),
        count: messages.len(),
        messages,
    }))
}

/// Publish an upload result into a room with members
pub async fn publish_file(
    State(state): State<Arc<AppState>>,
    Path(room_code): Path<String>,
    Json(request): Json<FileUploadedRequest>,
) -> StatusCode {
    let room = match parse_room(room_code) {
        Ok(room) => room,
        Err(status) => return status,
    };
    let (username, file) = match request.into_domain() {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Invalid upload result for room '{}': {}", room, e);
            return StatusCode::BAD_REQUEST;
        }
    };

    match state
        .session_manager
        .publish_file(&room, username, file)
        .await
    {
        Ok(true) => StatusCode::ACCEPTED,
        Ok(false) => StatusCode::NOT_FOUND,
        Err(e) => {
            tracing::error!("Failed to publish upload result in room '{}': {}", room, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
