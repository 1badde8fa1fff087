//! Infrastructure layer: in-memory stores, WebSocket pusher, wire DTOs and
//! the room directory implementations.

pub mod dto;
pub mod message_pusher;
pub mod repository;
pub mod room_directory;
