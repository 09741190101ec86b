//! Arena-backed layout tree for a single tab
//!
//! Each tab owns a [`TabArena`]: a binary tree whose leaves are terminals
//! and whose internal nodes are two-way splits. Nodes are stored in an
//! id-indexed map with no parent pointers; every structural query walks
//! down from the tab root, so the tree cannot become cyclic.
//!
//! ```text
//! Split(Vertical)
//! ├── Leaf(A)
//! └── Split(Horizontal)
//!     ├── Leaf(B)
//!     └── Leaf(C)
//! ```
//!
//! Content moving between tabs travels as an owned [`Subtree`] and is
//! re-inserted with fresh node identifiers, so an id never belongs to two
//! arenas.

use std::collections::HashMap;

use super::error::{LayoutError, LayoutResult};
use super::types::{MAX_SPLIT_RATIO, MIN_SPLIT_RATIO, NodeId, Orientation};
use crate::terminal::TerminalId;

/// A node in a tab's layout tree.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutNode {
    /// A pane holding exactly one terminal.
    Leaf {
        /// The terminal displayed in this pane.
        terminal: TerminalId,
    },
    /// A two-way division of the available area.
    Split {
        /// Axis of the division.
        orientation: Orientation,
        /// First child (left/top).
        first: NodeId,
        /// Second child (right/bottom).
        second: NodeId,
        /// Proportion of space allocated to the first child (0.0..=1.0).
        ratio: f64,
    },
}

/// Which child slot of a split a node occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSlot {
    /// The left/top slot.
    First,
    /// The right/bottom slot.
    Second,
}

/// An owned subtree detached from any arena.
///
/// Used when content relocates between tabs (unsplit, tab-merge): the
/// source arena gives up its nodes and the destination arena allocates
/// fresh identifiers on insertion.
#[derive(Debug, Clone, PartialEq)]
pub enum Subtree {
    /// A single terminal pane.
    Leaf(TerminalId),
    /// A two-way split of two owned subtrees.
    Split {
        /// Axis of the division.
        orientation: Orientation,
        /// Proportion of space allocated to the first child.
        ratio: f64,
        /// First child (left/top).
        first: Box<Subtree>,
        /// Second child (right/bottom).
        second: Box<Subtree>,
    },
}

impl Subtree {
    /// Returns every terminal in the subtree, left-to-right.
    #[must_use]
    pub fn terminal_ids(&self) -> Vec<TerminalId> {
        let mut ids = Vec::new();
        self.collect_terminals(&mut ids);
        ids
    }

    fn collect_terminals(&self, ids: &mut Vec<TerminalId>) {
        match self {
            Self::Leaf(terminal) => ids.push(*terminal),
            Self::Split { first, second, .. } => {
                first.collect_terminals(ids);
                second.collect_terminals(ids);
            }
        }
    }

    /// Builds a balanced split tree over `items`, dividing each level in
    /// half along `orientation`. Ratios reflect the item counts of the
    /// halves so every pane ends up with an equal share.
    ///
    /// Returns `None` for an empty slice.
    #[must_use]
    pub fn balanced(items: &[Subtree], orientation: Orientation) -> Option<Subtree> {
        match items {
            [] => None,
            [single] => Some(single.clone()),
            _ => {
                let mid = items.len() / 2;
                let first = Self::balanced(&items[..mid], orientation)?;
                let second = Self::balanced(&items[mid..], orientation)?;
                Some(Subtree::Split {
                    orientation,
                    ratio: mid as f64 / items.len() as f64,
                    first: Box::new(first),
                    second: Box::new(second),
                })
            }
        }
    }
}

/// The layout tree of one tab: an id-indexed node arena plus its root.
#[derive(Debug, Clone)]
pub struct TabArena {
    nodes: HashMap<NodeId, LayoutNode>,
    root: NodeId,
}

/// Outcome of removing a terminal's leaf from an arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The leaf was the tab root: the tab has no content left and must be
    /// closed by the caller.
    LastLeaf,
    /// The leaf's sibling was promoted into the vacated parent slot.
    Promoted {
        /// Root of the promoted sibling subtree.
        sibling: NodeId,
    },
}

impl TabArena {
    /// Creates an arena holding a single leaf, which becomes the root.
    #[must_use]
    pub fn with_leaf(terminal: TerminalId) -> Self {
        let mut nodes = HashMap::new();
        let root = NodeId::new();
        nodes.insert(root, LayoutNode::Leaf { terminal });
        Self { nodes, root }
    }

    /// Creates an arena from an owned subtree, allocating fresh node ids.
    #[must_use]
    pub fn from_subtree(subtree: Subtree) -> Self {
        let mut nodes = HashMap::new();
        let root = Self::insert_subtree(&mut nodes, subtree);
        Self { nodes, root }
    }

    fn insert_subtree(nodes: &mut HashMap<NodeId, LayoutNode>, subtree: Subtree) -> NodeId {
        let id = NodeId::new();
        let node = match subtree {
            Subtree::Leaf(terminal) => LayoutNode::Leaf { terminal },
            Subtree::Split {
                orientation,
                ratio,
                first,
                second,
            } => {
                let first = Self::insert_subtree(nodes, *first);
                let second = Self::insert_subtree(nodes, *second);
                LayoutNode::Split {
                    orientation,
                    first,
                    second,
                    ratio,
                }
            }
        };
        nodes.insert(id, node);
        id
    }

    /// Returns the current root node id.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the node behind an id, if the arena still holds it.
    #[must_use]
    pub fn get(&self, node: NodeId) -> Option<&LayoutNode> {
        self.nodes.get(&node)
    }

    /// Returns true if the arena holds the node.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Returns the number of nodes (leaves and splits) in the arena.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns every terminal in the tab, in pre-order (left-to-right).
    #[must_use]
    pub fn terminal_ids(&self) -> Vec<TerminalId> {
        let mut ids = Vec::new();
        self.collect_terminals(self.root, &mut ids);
        ids
    }

    fn collect_terminals(&self, node: NodeId, ids: &mut Vec<TerminalId>) {
        match self.nodes.get(&node) {
            Some(LayoutNode::Leaf { terminal }) => ids.push(*terminal),
            Some(LayoutNode::Split { first, second, .. }) => {
                let (first, second) = (*first, *second);
                self.collect_terminals(first, ids);
                self.collect_terminals(second, ids);
            }
            None => {}
        }
    }

    /// Returns the number of terminals in the tab.
    #[must_use]
    pub fn terminal_count(&self) -> usize {
        self.terminal_ids().len()
    }

    /// Returns the leftmost/topmost terminal.
    #[must_use]
    pub fn first_terminal(&self) -> Option<TerminalId> {
        let mut node = self.root;
        loop {
            match self.nodes.get(&node)? {
                LayoutNode::Leaf { terminal } => return Some(*terminal),
                LayoutNode::Split { first, .. } => node = *first,
            }
        }
    }

    /// Returns the depth of the tree (a lone leaf has depth 0).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth_of(self.root)
    }

    fn depth_of(&self, node: NodeId) -> usize {
        match self.nodes.get(&node) {
            Some(LayoutNode::Split { first, second, .. }) => {
                1 + self.depth_of(*first).max(self.depth_of(*second))
            }
            _ => 0,
        }
    }

    /// Finds the leaf node housing a terminal.
    #[must_use]
    pub fn leaf_of(&self, terminal: TerminalId) -> Option<NodeId> {
        self.find_leaf(self.root, terminal)
    }

    fn find_leaf(&self, node: NodeId, wanted: TerminalId) -> Option<NodeId> {
        match self.nodes.get(&node)? {
            LayoutNode::Leaf { terminal } => (*terminal == wanted).then_some(node),
            LayoutNode::Split { first, second, .. } => {
                let (first, second) = (*first, *second);
                self.find_leaf(first, wanted)
                    .or_else(|| self.find_leaf(second, wanted))
            }
        }
    }

    /// Finds the parent split of a node and the slot the node occupies.
    ///
    /// Walks from the root; O(depth). Returns `None` for the root itself
    /// or an id the arena does not hold.
    #[must_use]
    pub fn parent_of(&self, child: NodeId) -> Option<(NodeId, ChildSlot)> {
        if child == self.root {
            return None;
        }
        self.find_parent(self.root, child)
    }

    fn find_parent(&self, node: NodeId, child: NodeId) -> Option<(NodeId, ChildSlot)> {
        match self.nodes.get(&node)? {
            LayoutNode::Leaf { .. } => None,
            LayoutNode::Split { first, second, .. } => {
                if *first == child {
                    return Some((node, ChildSlot::First));
                }
                if *second == child {
                    return Some((node, ChildSlot::Second));
                }
                let (first, second) = (*first, *second);
                self.find_parent(first, child)
                    .or_else(|| self.find_parent(second, child))
            }
        }
    }

    /// Allocates a fresh leaf node for `terminal`, detached from the tree.
    ///
    /// The caller wires it in via [`split_node`](Self::split_node).
    pub fn insert_leaf(&mut self, terminal: TerminalId) -> NodeId {
        let id = NodeId::new();
        self.nodes.insert(id, LayoutNode::Leaf { terminal });
        id
    }

    /// Allocates fresh nodes for an owned subtree, detached from the tree.
    ///
    /// The caller wires the returned root in via
    /// [`split_node`](Self::split_node).
    pub fn insert_detached(&mut self, subtree: Subtree) -> NodeId {
        Self::insert_subtree(&mut self.nodes, subtree)
    }

    /// Splits `target`: a new split node takes the target's place in the
    /// tree, with the target as its first child and `new_content` (a
    /// previously allocated detached node) as its second.
    ///
    /// Returns the id of the new split node.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::NodeNotFound`] if either node is not in the
    /// arena.
    pub fn split_node(
        &mut self,
        target: NodeId,
        orientation: Orientation,
        new_content: NodeId,
        ratio: f64,
    ) -> LayoutResult<NodeId> {
        if !self.contains(target) {
            return Err(LayoutError::NodeNotFound(target));
        }
        if !self.contains(new_content) {
            return Err(LayoutError::NodeNotFound(new_content));
        }

        let parent = self.parent_of(target);
        let split = NodeId::new();
        self.nodes.insert(
            split,
            LayoutNode::Split {
                orientation,
                first: target,
                second: new_content,
                ratio: ratio.clamp(MIN_SPLIT_RATIO, MAX_SPLIT_RATIO),
            },
        );

        match parent {
            None => self.root = split,
            Some((parent, slot)) => self.set_child(parent, slot, split),
        }
        Ok(split)
    }

    fn set_child(&mut self, parent: NodeId, slot: ChildSlot, child: NodeId) {
        if let Some(LayoutNode::Split { first, second, .. }) = self.nodes.get_mut(&parent) {
            match slot {
                ChildSlot::First => *first = child,
                ChildSlot::Second => *second = child,
            }
        }
    }

    /// Removes the leaf housing `terminal` and promotes its sibling into
    /// the vacated slot, exactly as Unsplit does, except the sibling stays
    /// in this tree.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::TerminalNotFound`] if no leaf houses the
    /// terminal.
    pub fn remove_terminal(&mut self, terminal: TerminalId) -> LayoutResult<RemoveOutcome> {
        let leaf = self
            .leaf_of(terminal)
            .ok_or(LayoutError::TerminalNotFound(terminal))?;

        let Some((split, slot)) = self.parent_of(leaf) else {
            // Sole pane of the tab; the caller closes the tab.
            return Ok(RemoveOutcome::LastLeaf);
        };

        let sibling = match self.nodes.get(&split) {
            Some(LayoutNode::Split { first, second, .. }) => match slot {
                ChildSlot::First => *second,
                ChildSlot::Second => *first,
            },
            _ => return Err(LayoutError::NodeNotFound(split)),
        };

        match self.parent_of(split) {
            None => self.root = sibling,
            Some((grandparent, split_slot)) => self.set_child(grandparent, split_slot, sibling),
        }
        self.nodes.remove(&split);
        self.nodes.remove(&leaf);
        Ok(RemoveOutcome::Promoted { sibling })
    }

    /// Inverse of a single-pane split: splices the split above `terminal`
    /// out of the tree (the leaf takes the split's place) and returns the
    /// sibling subtree as owned content, removed from this arena.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::TerminalNotFound`] if no leaf houses the
    /// terminal, or [`LayoutError::NotSplit`] if the leaf is the tab's
    /// only pane.
    pub fn extract_sibling(&mut self, terminal: TerminalId) -> LayoutResult<Subtree> {
        let leaf = self
            .leaf_of(terminal)
            .ok_or(LayoutError::TerminalNotFound(terminal))?;
        let (split, slot) = self
            .parent_of(leaf)
            .ok_or(LayoutError::NotSplit(terminal))?;

        let sibling = match self.nodes.get(&split) {
            Some(LayoutNode::Split { first, second, .. }) => match slot {
                ChildSlot::First => *second,
                ChildSlot::Second => *first,
            },
            _ => return Err(LayoutError::NodeNotFound(split)),
        };

        match self.parent_of(split) {
            None => self.root = leaf,
            Some((grandparent, split_slot)) => self.set_child(grandparent, split_slot, leaf),
        }
        self.nodes.remove(&split);
        self.take_subtree(sibling)
    }

    /// Removes the whole tree and returns it as owned content.
    ///
    /// The arena is left empty and must not be used afterwards; this is
    /// the last step of closing a tab whose content merges elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::NodeNotFound`] if the arena is corrupted.
    pub fn into_subtree(mut self) -> LayoutResult<Subtree> {
        let root = self.root;
        self.take_subtree(root)
    }

    fn take_subtree(&mut self, node: NodeId) -> LayoutResult<Subtree> {
        match self.nodes.remove(&node) {
            None => Err(LayoutError::NodeNotFound(node)),
            Some(LayoutNode::Leaf { terminal }) => Ok(Subtree::Leaf(terminal)),
            Some(LayoutNode::Split {
                orientation,
                first,
                second,
                ratio,
            }) => {
                let first = self.take_subtree(first)?;
                let second = self.take_subtree(second)?;
                Ok(Subtree::Split {
                    orientation,
                    ratio,
                    first: Box::new(first),
                    second: Box::new(second),
                })
            }
        }
    }

    /// Swaps the terminal held by a leaf without changing tree shape.
    ///
    /// Used by reconnect/restart so split ratios and siblings survive.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::TerminalNotFound`] if no leaf houses `old`.
    pub fn replace_terminal(&mut self, old: TerminalId, new: TerminalId) -> LayoutResult<()> {
        let leaf = self.leaf_of(old).ok_or(LayoutError::TerminalNotFound(old))?;
        if let Some(LayoutNode::Leaf { terminal }) = self.nodes.get_mut(&leaf) {
            *terminal = new;
        }
        Ok(())
    }

    /// Updates the ratio of a split node, clamped to [0.0, 1.0].
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::NodeNotFound`] if the node is missing or is
    /// not a split.
    pub fn set_split_ratio(&mut self, node: NodeId, new_ratio: f64) -> LayoutResult<()> {
        match self.nodes.get_mut(&node) {
            Some(LayoutNode::Split { ratio, .. }) => {
                *ratio = new_ratio.clamp(MIN_SPLIT_RATIO, MAX_SPLIT_RATIO);
                Ok(())
            }
            _ => Err(LayoutError::NodeNotFound(node)),
        }
    }

    /// Verifies the structural invariants of the arena:
    /// every split has two existing, distinct children; the root resolves;
    /// every stored node is reachable from the root; no terminal appears
    /// in two leaves.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvariantViolated`] naming the first
    /// violation found.
    pub fn check_invariants(&self) -> LayoutResult<()> {
        if !self.contains(self.root) {
            return Err(LayoutError::InvariantViolated(format!(
                "root {} does not resolve",
                self.root
            )));
        }

        let mut visited = Vec::new();
        let mut terminals = Vec::new();
        self.walk_invariants(self.root, &mut visited, &mut terminals)?;

        if visited.len() != self.nodes.len() {
            return Err(LayoutError::InvariantViolated(format!(
                "{} nodes stored but {} reachable from root",
                self.nodes.len(),
                visited.len()
            )));
        }
        Ok(())
    }

    fn walk_invariants(
        &self,
        node: NodeId,
        visited: &mut Vec<NodeId>,
        terminals: &mut Vec<TerminalId>,
    ) -> LayoutResult<()> {
        if visited.contains(&node) {
            return Err(LayoutError::InvariantViolated(format!(
                "node {node} reachable twice"
            )));
        }
        visited.push(node);

        match self.nodes.get(&node) {
            None => Err(LayoutError::InvariantViolated(format!(
                "dangling child reference {node}"
            ))),
            Some(LayoutNode::Leaf { terminal }) => {
                if terminals.contains(terminal) {
                    return Err(LayoutError::InvariantViolated(format!(
                        "terminal {terminal} owned by two leaves"
                    )));
                }
                terminals.push(*terminal);
                Ok(())
            }
            Some(LayoutNode::Split { first, second, .. }) => {
                if first == second {
                    return Err(LayoutError::InvariantViolated(format!(
                        "split {node} has identical children"
                    )));
                }
                let (first, second) = (*first, *second);
                self.walk_invariants(first, visited, terminals)?;
                self.walk_invariants(second, visited, terminals)
            }
        }
    }
}
