//! UseCase 層
//!
//! Room Session Manager を中心に、配信・入力状態の失効・参照系クエリを提供します。

mod broadcast;
mod error;
mod get_history;
mod get_room_detail;
mod get_rooms;
mod presence_sweeper;
mod room_session;

pub use broadcast::BroadcastDispatcher;
pub use error::{QueryError, SessionError};
pub use get_history::GetHistoryUseCase;
pub use get_room_detail::{GetRoomDetailUseCase, RoomDetail};
pub use get_rooms::{GetRoomsUseCase, RoomSummary};
pub use presence_sweeper::PresenceSweeper;
pub use room_session::{ConnectionState, RoomSessionManager, RoomStores, SessionSettings};
