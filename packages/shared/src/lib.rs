//! Shared utilities for the DropZone workspace.

pub mod logger;
pub mod time;
