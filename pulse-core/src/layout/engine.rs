//! Workspace/tab layout engine
//!
//! Owns every workspace (top-level window), every tab, and each tab's
//! [`TabArena`]. All restructuring operations live here: opening tabs,
//! splitting panes, unsplitting, closing terminals, merging one tab's
//! content into another, detaching tabs to new windows.
//!
//! The engine is pure bookkeeping: terminal handles are created and
//! disposed by the session context around it, and cluster membership is
//! revoked by the caller before a terminal is removed here.

use std::collections::HashMap;

use tracing::debug;

use super::error::{LayoutError, LayoutResult};
use super::tree::{RemoveOutcome, Subtree, TabArena};
use super::types::{DEFAULT_SPLIT_RATIO, NodeId, Orientation, SplitMode, TabId, WorkspaceId};
use crate::terminal::TerminalId;

/// A tab: one layout tree plus display metadata.
#[derive(Debug, Clone)]
pub struct Tab {
    /// Stable tab identifier.
    pub id: TabId,
    /// Explicit user-set title; when `None` the title is derived from
    /// member connection names.
    pub title: Option<String>,
    /// Workspace currently displaying the tab.
    pub workspace: WorkspaceId,
    arena: TabArena,
}

impl Tab {
    /// Read access to the tab's layout tree.
    #[must_use]
    pub const fn arena(&self) -> &TabArena {
        &self.arena
    }
}

/// A top-level window holding an ordered list of tabs.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Stable workspace identifier.
    pub id: WorkspaceId,
    /// Tabs in display order.
    pub tabs: Vec<TabId>,
    /// The workspace created at startup. It survives losing its last
    /// tab; detached workspaces do not.
    pub primary: bool,
}

/// What a split installs as the new second child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitContent {
    /// A freshly created terminal.
    Terminal(TerminalId),
    /// The entire content of another tab; that tab is closed and its
    /// nodes are relocated (with fresh ids) into the target tab.
    TabContent(TabId),
}

/// Result of removing a terminal from its tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The sibling pane was promoted; the tab lives on.
    SiblingPromoted,
    /// The terminal was the tab's sole pane, so the tab was closed.
    TabClosed {
        /// The tab that was removed.
        tab: TabId,
        /// Set when the tab's workspace was non-primary and became
        /// empty, so it was destroyed too.
        workspace_destroyed: bool,
    },
}

/// Process-wide layout state: every workspace, tab, and layout tree.
#[derive(Debug)]
pub struct LayoutEngine {
    workspaces: HashMap<WorkspaceId, Workspace>,
    tabs: HashMap<TabId, Tab>,
    primary: WorkspaceId,
}

impl LayoutEngine {
    /// Creates the engine with one empty primary workspace.
    #[must_use]
    pub fn new() -> Self {
        let primary = WorkspaceId::new();
        let mut workspaces = HashMap::new();
        workspaces.insert(
            primary,
            Workspace {
                id: primary,
                tabs: Vec::new(),
                primary: true,
            },
        );
        Self {
            workspaces,
            tabs: HashMap::new(),
            primary,
        }
    }

    /// The workspace created at startup.
    #[must_use]
    pub const fn primary_workspace(&self) -> WorkspaceId {
        self.primary
    }

    /// Looks up a workspace.
    #[must_use]
    pub fn workspace(&self, id: WorkspaceId) -> Option<&Workspace> {
        self.workspaces.get(&id)
    }

    /// Number of live workspaces.
    #[must_use]
    pub fn workspace_count(&self) -> usize {
        self.workspaces.len()
    }

    /// Looks up a tab.
    #[must_use]
    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.tabs.get(&id)
    }

    /// Number of live tabs across all workspaces.
    #[must_use]
    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    /// Finds the tab whose tree houses a terminal.
    #[must_use]
    pub fn tab_of_terminal(&self, terminal: TerminalId) -> Option<TabId> {
        self.tabs
            .values()
            .find(|tab| tab.arena.leaf_of(terminal).is_some())
            .map(|tab| tab.id)
    }

    /// Every terminal in a tab, left-to-right.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::TabNotFound`] for an unknown tab.
    pub fn terminals_in_tab(&self, tab: TabId) -> LayoutResult<Vec<TerminalId>> {
        Ok(self.tab_or_err(tab)?.arena.terminal_ids())
    }

    /// Every terminal across every workspace.
    #[must_use]
    pub fn all_terminals(&self) -> Vec<TerminalId> {
        self.tabs
            .values()
            .flat_map(|tab| tab.arena.terminal_ids())
            .collect()
    }

    fn tab_or_err(&self, tab: TabId) -> LayoutResult<&Tab> {
        self.tabs.get(&tab).ok_or(LayoutError::TabNotFound(tab))
    }

    fn tab_mut_or_err(&mut self, tab: TabId) -> LayoutResult<&mut Tab> {
        self.tabs.get_mut(&tab).ok_or(LayoutError::TabNotFound(tab))
    }

    /// Opens a new tab holding a single terminal.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::WorkspaceNotFound`] for an unknown
    /// workspace.
    pub fn open_tab(&mut self, workspace: WorkspaceId, terminal: TerminalId) -> LayoutResult<TabId> {
        self.open_tab_with(workspace, TabArena::with_leaf(terminal))
    }

    /// Opens a new tab around pre-built content (grid layouts, unsplit).
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::WorkspaceNotFound`] for an unknown
    /// workspace.
    pub fn open_tab_from_subtree(
        &mut self,
        workspace: WorkspaceId,
        content: Subtree,
    ) -> LayoutResult<TabId> {
        self.open_tab_with(workspace, TabArena::from_subtree(content))
    }

    fn open_tab_with(&mut self, workspace: WorkspaceId, arena: TabArena) -> LayoutResult<TabId> {
        let ws = self
            .workspaces
            .get_mut(&workspace)
            .ok_or(LayoutError::WorkspaceNotFound(workspace))?;
        let id = TabId::new();
        ws.tabs.push(id);
        self.tabs.insert(
            id,
            Tab {
                id,
                title: None,
                workspace,
                arena,
            },
        );
        debug!(tab = %id, workspace = %workspace, "tab opened");
        Ok(id)
    }

    /// Splits a pane or the whole tab.
    ///
    /// `target` names the terminal whose pane is divided; with no
    /// concrete terminal (or [`SplitMode::WholeTab`]) the tab root is
    /// divided instead. `content` is either a fresh terminal or another
    /// tab's whole content; in the latter case the donor tab is closed
    /// and its nodes relocated under fresh ids.
    ///
    /// Returns the id of the new split node.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::MergeIntoSelf`] when a tab is asked to
    /// absorb itself, and the usual not-found errors otherwise.
    pub fn split(
        &mut self,
        tab: TabId,
        target: Option<TerminalId>,
        orientation: Orientation,
        content: SplitContent,
        mode: SplitMode,
    ) -> LayoutResult<NodeId> {
        // Validate the target before any destructive step: a donor tab
        // must not be consumed when the split itself cannot happen.
        let target_tab = self.tab_or_err(tab)?;
        if let (SplitMode::SinglePane, Some(terminal)) = (mode, target) {
            if target_tab.arena.leaf_of(terminal).is_none() {
                return Err(LayoutError::TerminalNotFound(terminal));
            }
        }

        let subtree = match content {
            SplitContent::Terminal(terminal) => Subtree::Leaf(terminal),
            SplitContent::TabContent(source) => {
                if source == tab {
                    return Err(LayoutError::MergeIntoSelf(tab));
                }
                self.take_tab_content(source)?
            }
        };

        let arena = &mut self.tab_mut_or_err(tab)?.arena;
        // With nothing concrete selected there is no leaf to divide.
        let split_target = match (mode, target) {
            (SplitMode::SinglePane, Some(terminal)) => arena
                .leaf_of(terminal)
                .ok_or(LayoutError::TerminalNotFound(terminal))?,
            _ => arena.root(),
        };
        let content_node = arena.insert_detached(subtree);
        let split = arena.split_node(split_target, orientation, content_node, DEFAULT_SPLIT_RATIO)?;
        debug!(tab = %tab, node = %split, ?orientation, "pane split");
        Ok(split)
    }

    /// Closes a tab and returns its content as an owned subtree, tearing
    /// down a non-primary workspace that becomes empty.
    fn take_tab_content(&mut self, tab: TabId) -> LayoutResult<Subtree> {
        let removed = self
            .tabs
            .remove(&tab)
            .ok_or(LayoutError::TabNotFound(tab))?;
        self.forget_tab(removed.workspace, tab);
        removed.arena.into_subtree()
    }

    /// Drops a tab id from its workspace's list, destroying the
    /// workspace when it was non-primary and is now empty. Returns true
    /// when the workspace was destroyed.
    fn forget_tab(&mut self, workspace: WorkspaceId, tab: TabId) -> bool {
        let Some(ws) = self.workspaces.get_mut(&workspace) else {
            return false;
        };
        ws.tabs.retain(|id| *id != tab);
        if ws.tabs.is_empty() && !ws.primary {
            self.workspaces.remove(&workspace);
            debug!(workspace = %workspace, "empty workspace destroyed");
            return true;
        }
        false
    }

    /// Inverse of a single-pane split: the sibling subtree of the pane
    /// housing `terminal` moves out into a brand-new tab in the same
    /// workspace. Returns the new tab's id.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::NotSplit`] when the terminal is its tab's
    /// only pane.
    pub fn unsplit(&mut self, terminal: TerminalId) -> LayoutResult<TabId> {
        let tab = self
            .tab_of_terminal(terminal)
            .ok_or(LayoutError::TerminalNotFound(terminal))?;
        let owner = self.tab_mut_or_err(tab)?;
        let workspace = owner.workspace;
        let sibling = owner.arena.extract_sibling(terminal)?;
        let new_tab = self.open_tab_from_subtree(workspace, sibling)?;
        debug!(from = %tab, to = %new_tab, "pane unsplit into new tab");
        Ok(new_tab)
    }

    /// Removes the pane housing `terminal`. The caller revokes cluster
    /// membership and disposes the handle first.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::TerminalNotFound`] when no tab houses the
    /// terminal.
    pub fn close_terminal(&mut self, terminal: TerminalId) -> LayoutResult<CloseOutcome> {
        let tab = self
            .tab_of_terminal(terminal)
            .ok_or(LayoutError::TerminalNotFound(terminal))?;
        let owner = self.tab_mut_or_err(tab)?;
        match owner.arena.remove_terminal(terminal)? {
            RemoveOutcome::Promoted { .. } => Ok(CloseOutcome::SiblingPromoted),
            RemoveOutcome::LastLeaf => {
                // Zero-terminal tabs never exist: the tab closes with its
                // last pane.
                let workspace = owner.workspace;
                self.tabs.remove(&tab);
                let workspace_destroyed = self.forget_tab(workspace, tab);
                debug!(tab = %tab, workspace_destroyed, "tab closed with last pane");
                Ok(CloseOutcome::TabClosed {
                    tab,
                    workspace_destroyed,
                })
            }
        }
    }

    /// Swaps a terminal in place; tree shape, ratios and siblings are
    /// untouched. Used by reconnect/restart.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::TerminalNotFound`] when no tab houses
    /// `old`.
    pub fn replace_terminal(&mut self, old: TerminalId, new: TerminalId) -> LayoutResult<()> {
        let tab = self
            .tab_of_terminal(old)
            .ok_or(LayoutError::TerminalNotFound(old))?;
        self.tab_mut_or_err(tab)?.arena.replace_terminal(old, new)
    }

    /// Moves a tab to another workspace, or to a brand-new one when
    /// `target` is `None` (detach). Returns the destination workspace.
    ///
    /// # Errors
    ///
    /// Returns the usual not-found errors.
    pub fn move_tab(
        &mut self,
        tab: TabId,
        target: Option<WorkspaceId>,
    ) -> LayoutResult<WorkspaceId> {
        let source = self.tab_or_err(tab)?.workspace;
        let dest = match target {
            Some(ws) => {
                if !self.workspaces.contains_key(&ws) {
                    return Err(LayoutError::WorkspaceNotFound(ws));
                }
                ws
            }
            None => {
                let ws = WorkspaceId::new();
                self.workspaces.insert(
                    ws,
                    Workspace {
                        id: ws,
                        tabs: Vec::new(),
                        primary: false,
                    },
                );
                ws
            }
        };
        if dest == source {
            return Ok(dest);
        }

        self.forget_tab(source, tab);
        if let Some(ws) = self.workspaces.get_mut(&dest) {
            ws.tabs.push(tab);
        }
        if let Some(t) = self.tabs.get_mut(&tab) {
            t.workspace = dest;
        }
        debug!(tab = %tab, from = %source, to = %dest, "tab moved");
        Ok(dest)
    }

    /// Sets an explicit tab title; `None` reverts to the derived title.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::TabNotFound`] for an unknown tab.
    pub fn set_tab_title(&mut self, tab: TabId, title: Option<String>) -> LayoutResult<()> {
        self.tab_mut_or_err(tab)?.title = title;
        Ok(())
    }

    /// Computes a tab's display title: the explicit override when set,
    /// otherwise the unique member connection names joined with " + ".
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::TabNotFound`] for an unknown tab.
    pub fn tab_title<F>(&self, tab: TabId, mut resolve_name: F) -> LayoutResult<String>
    where
        F: FnMut(TerminalId) -> Option<String>,
    {
        let tab = self.tab_or_err(tab)?;
        if let Some(title) = &tab.title {
            return Ok(title.clone());
        }
        let mut names: Vec<String> = Vec::new();
        for terminal in tab.arena.terminal_ids() {
            if let Some(name) = resolve_name(terminal) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        Ok(names.join(" + "))
    }

    /// Updates a split's ratio inside a tab's tree.
    ///
    /// # Errors
    ///
    /// Returns the usual not-found errors.
    pub fn set_split_ratio(&mut self, tab: TabId, node: NodeId, ratio: f64) -> LayoutResult<()> {
        self.tab_mut_or_err(tab)?.arena.set_split_ratio(node, ratio)
    }

    /// Verifies structural invariants on every tab's tree and on the
    /// workspace/tab cross-references.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvariantViolated`] on the first violation.
    pub fn check_invariants(&self) -> LayoutResult<()> {
        for tab in self.tabs.values() {
            tab.arena.check_invariants()?;
            let ws = self
                .workspaces
                .get(&tab.workspace)
                .ok_or_else(|| {
                    LayoutError::InvariantViolated(format!(
                        "tab {} references missing workspace {}",
                        tab.id, tab.workspace
                    ))
                })?;
            if !ws.tabs.contains(&tab.id) {
                return Err(LayoutError::InvariantViolated(format!(
                    "tab {} missing from workspace {} list",
                    tab.id, ws.id
                )));
            }
        }
        for ws in self.workspaces.values() {
            if ws.tabs.is_empty() && !ws.primary {
                return Err(LayoutError::InvariantViolated(format!(
                    "non-primary workspace {} has no tabs",
                    ws.id
                )));
            }
            for tab in &ws.tabs {
                if !self.tabs.contains_key(tab) {
                    return Err(LayoutError::InvariantViolated(format!(
                        "workspace {} lists missing tab {tab}",
                        ws.id
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Picks a near-square `(columns, rows)` shape for `count` panes,
/// preferring more balanced shapes and breaking ties toward perfect
/// grids (no short last row).
#[must_use]
pub fn grid_shape(count: usize) -> (usize, usize) {
    if count == 0 {
        return (0, 0);
    }
    let mut best = (count, 1);
    let mut best_score = (usize::MAX, true);
    for cols in 1..=count {
        let rows = count.div_ceil(cols);
        let score = (cols.abs_diff(rows), cols * rows != count);
        if score < best_score {
            best_score = score;
            best = (cols, rows);
        }
    }
    best
}

/// Arranges terminals into a near-square grid subtree: rows of columns,
/// ratios weighted so every pane gets an equal share.
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn grid_subtree(terminals: &[TerminalId]) -> Option<Subtree> {
    let (cols, _) = grid_shape(terminals.len());
    let rows: Vec<Subtree> = terminals
        .chunks(cols)
        .map(|row| {
            let leaves: Vec<Subtree> = row.iter().map(|t| Subtree::Leaf(*t)).collect();
            Subtree::balanced(&leaves, Orientation::Horizontal)
        })
        .collect::<Option<Vec<_>>>()?;
    Subtree::balanced(&rows, Orientation::Vertical)
}
