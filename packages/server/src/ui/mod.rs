//! Network surface: axum router, handlers and the server runner.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
