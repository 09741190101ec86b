//! History entries recorded for orchestrator-driven commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded command exchange with an orchestrator process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the exchange happened.
    pub timestamp: DateTime<Utc>,
    /// The command or protocol line as received.
    pub command: String,
    /// Whether the line was understood and executed.
    pub success: bool,
    /// Captured output (the reply sent back, or empty on failure).
    pub output: String,
}

impl HistoryEntry {
    /// Records a successfully executed command and its reply.
    #[must_use]
    pub fn success(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            command: command.into(),
            success: true,
            output: output.into(),
        }
    }

    /// Records a failed or malformed command with empty output.
    #[must_use]
    pub fn failure(command: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            command: command.into(),
            success: false,
            output: String::new(),
        }
    }
}
