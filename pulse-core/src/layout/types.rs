//! Core identifier types and enums for the layout engine
//!
//! Every structural entity in the layout tree is addressed by an opaque
//! uuid-backed identifier. Identifiers are unique for the lifetime of the
//! process; moving content between tabs allocates fresh node identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default split ratio (50% of available space to the first child).
pub const DEFAULT_SPLIT_RATIO: f64 = 0.5;

/// Minimum valid split ratio.
pub const MIN_SPLIT_RATIO: f64 = 0.0;

/// Maximum valid split ratio.
pub const MAX_SPLIT_RATIO: f64 = 1.0;

/// Unique identifier for a node in a tab's layout arena.
///
/// A node identifier belongs to exactly one tab's arena at a time.
/// Relocating a subtree to another tab reallocates its node identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Creates a new random node ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// Unique identifier for a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(pub Uuid);

impl TabId {
    /// Creates a new random tab ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tab({})", self.0)
    }
}

/// Unique identifier for a workspace (top-level window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkspaceId(pub Uuid);

impl WorkspaceId {
    /// Creates a new random workspace ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorkspaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Workspace({})", self.0)
    }
}

/// Axis along which a split divides its area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Side-by-side panes (divider is vertical).
    Horizontal,
    /// Stacked panes (divider is horizontal).
    Vertical,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => write!(f, "Horizontal"),
            Self::Vertical => write!(f, "Vertical"),
        }
    }
}

/// Which part of a tab a split operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    /// Split the whole tab: the tab root becomes the first child of the
    /// new split, regardless of how deeply it is already divided.
    WholeTab,
    /// Split only the pane housing the target terminal.
    SinglePane,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_new_creates_unique_ids() {
        assert_ne!(NodeId::new(), NodeId::new());
    }

    #[test]
    fn tab_id_new_creates_unique_ids() {
        assert_ne!(TabId::new(), TabId::new());
    }

    #[test]
    fn workspace_id_new_creates_unique_ids() {
        assert_ne!(WorkspaceId::new(), WorkspaceId::new());
    }

    #[test]
    fn node_id_equality_follows_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(NodeId(uuid), NodeId(uuid));
    }

    #[test]
    fn id_display_includes_kind() {
        assert!(format!("{}", NodeId(Uuid::nil())).contains("Node("));
        assert!(format!("{}", TabId(Uuid::nil())).contains("Tab("));
        assert!(format!("{}", WorkspaceId(Uuid::nil())).contains("Workspace("));
    }

    #[test]
    fn orientation_display() {
        assert_eq!(format!("{}", Orientation::Horizontal), "Horizontal");
        assert_eq!(format!("{}", Orientation::Vertical), "Vertical");
    }
}
