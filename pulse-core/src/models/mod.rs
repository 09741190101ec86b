//! Data models shared across the engine.

mod connection;
mod history;

pub use connection::{Connection, ConnectionKind};
pub use history::HistoryEntry;
