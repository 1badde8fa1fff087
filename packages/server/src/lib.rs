//! Real-time room messaging and presence core.
//!
//! Clients join named rooms over WebSocket, exchange chat and file events,
//! signal typing activity, and receive a replay of recent history on join.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
