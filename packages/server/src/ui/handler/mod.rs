//! HTTP and WebSocket handlers.

mod http;
mod websocket;

pub use http::{get_history, get_room_detail, get_rooms, health_check, publish_file};
pub use websocket::websocket_handler;
