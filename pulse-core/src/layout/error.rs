//! Error types for layout tree operations

use super::types::{NodeId, TabId, WorkspaceId};
use crate::terminal::TerminalId;

/// Errors that can occur during layout operations.
///
/// These are structural errors: in a correct embedding they indicate a
/// programming error (operating on an identifier that no longer exists).
/// Callers in release builds treat them as no-op failures; debug builds
/// assert on them at the call sites.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// The specified tab was not found.
    #[error("tab not found: {0}")]
    TabNotFound(TabId),

    /// The specified workspace was not found.
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(WorkspaceId),

    /// The specified node was not found in the tab's arena.
    #[error("layout node not found: {0}")]
    NodeNotFound(NodeId),

    /// No leaf in the tab houses the specified terminal.
    #[error("terminal not found in any layout: {0}")]
    TerminalNotFound(TerminalId),

    /// Unsplit was requested on a tab with a single pane.
    #[error("terminal {0} is not part of a split")]
    NotSplit(TerminalId),

    /// A tab cannot be merged into itself.
    #[error("cannot merge tab {0} into itself")]
    MergeIntoSelf(TabId),

    /// The arena violates a structural invariant (corrupted tree).
    #[error("layout invariant violated: {0}")]
    InvariantViolated(String),
}

/// Result type alias for layout operations.
pub type LayoutResult<T> = std::result::Result<T, LayoutError>;
