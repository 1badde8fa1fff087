//! Shared application state.

use std::sync::Arc;

use crate::usecase::{GetHistoryUseCase, GetRoomDetailUseCase, GetRoomsUseCase, RoomSessionManager};

pub struct AppState {
    /// RoomSessionManager（入退室とイベント処理の唯一の入口）
    pub session_manager: Arc<RoomSessionManager>,
    /// GetHistoryUseCase（履歴取得のユースケース）
    pub get_history_usecase: Arc<GetHistoryUseCase>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// Bound of each connection's outbound queue
    pub outbound_queue_capacity: usize,
}
