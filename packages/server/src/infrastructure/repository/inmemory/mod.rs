//! InMemory ストア実装
//!
//! ルームコードをキーとした `DashMap` に状態を保持します。ロックはシャード単位で
//! 取られるため、異なるルームへの操作が 1 つのグローバルロックで直列化されることは
//! ありません。

pub mod connection;
pub mod history;
pub mod presence;

pub use connection::InMemoryConnectionRegistry;
pub use history::InMemoryHistoryBuffer;
pub use presence::InMemoryPresenceTracker;
