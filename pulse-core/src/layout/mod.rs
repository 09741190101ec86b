//! Tab layout: workspaces, tabs, and per-tab split trees.

mod engine;
mod error;
mod tree;
mod types;

pub use engine::{
    CloseOutcome, LayoutEngine, SplitContent, Tab, Workspace, grid_shape, grid_subtree,
};
pub use error::{LayoutError, LayoutResult};
pub use tree::{ChildSlot, LayoutNode, RemoveOutcome, Subtree, TabArena};
pub use types::{
    DEFAULT_SPLIT_RATIO, MAX_SPLIT_RATIO, MIN_SPLIT_RATIO, NodeId, Orientation, SplitMode, TabId,
    WorkspaceId,
};
