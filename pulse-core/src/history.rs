//! Per-connection command history log.

use std::collections::HashMap;

use tracing::warn;
use uuid::Uuid;

use crate::models::HistoryEntry;

/// In-memory history of orchestrator command exchanges, keyed by
/// connection id. Ephemeral per process run.
#[derive(Debug, Default)]
pub struct HistoryLog {
    entries: HashMap<Uuid, Vec<HistoryEntry>>,
}

impl HistoryLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry under a connection.
    pub fn record(&mut self, connection: Uuid, entry: HistoryEntry) {
        if !entry.success {
            warn!(%connection, command = %entry.command, "command failed");
        }
        self.entries.entry(connection).or_default().push(entry);
    }

    /// Entries recorded for a connection, oldest first.
    #[must_use]
    pub fn entries_for(&self, connection: Uuid) -> &[HistoryEntry] {
        self.entries.get(&connection).map_or(&[], Vec::as_slice)
    }

    /// Total entries across all connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops all entries for a connection.
    pub fn clear(&mut self, connection: Uuid) {
        self.entries.remove(&connection);
    }
}
