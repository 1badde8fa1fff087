//! Data Transfer Objects (DTOs) for the DropZone server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket message DTOs (the wire contract clients decode)
//! - `http`: HTTP API request/response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
