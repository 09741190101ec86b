//! Crate-wide error types for session operations.

use uuid::Uuid;

use crate::layout::LayoutError;

/// Errors surfaced by session-level operations.
///
/// Structural failures wrap [`LayoutError`]; process failures (spawn,
/// orchestrator I/O) carry the underlying cause and are recoverable —
/// they land in the history log rather than tearing down the engine.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// An identifier did not resolve to a live entity.
    #[error("not found: {0}")]
    NotFound(String),

    /// The connection id is not in the store.
    #[error("connection not found: {0}")]
    ConnectionNotFound(Uuid),

    /// The connection is flagged as not clusterable.
    #[error("connection {0} cannot join clusters")]
    NotClusterable(Uuid),

    /// The terminal-widget layer failed to spawn a process.
    #[error("failed to spawn terminal: {0}")]
    SpawnFailed(String),

    /// A structural layout operation failed.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Reading from or writing to an orchestrator process failed.
    #[error("orchestrator i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// An orchestrator protocol line could not be parsed.
    #[error("malformed orchestrator message: {0}")]
    Protocol(#[from] serde_json::Error),
}

/// Result type alias for session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;
