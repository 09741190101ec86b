//! Cluster broadcast management
//!
//! A cluster is a named group of live terminals whose keystrokes and
//! paste actions are fanned out to every other member. Membership is
//! exclusive: joining a cluster leaves the previous one first, and a
//! cluster is deleted the moment its last member leaves.

mod keys;

pub use keys::BroadcastKey;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::terminal::{TerminalHandle, TerminalId, TerminalInput};

/// Unique identifier for a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterId(pub Uuid);

impl ClusterId {
    /// Generates a new random cluster ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClusterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named group of terminals receiving each other's input.
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Unique identifier for this cluster.
    pub id: ClusterId,
    /// Display name shown in menus and tab tooltips.
    pub name: String,
    // Insertion order; broadcast delivers in this order.
    members: Vec<TerminalId>,
}

impl Cluster {
    /// Member terminals in broadcast order.
    #[must_use]
    pub fn members(&self) -> &[TerminalId] {
        &self.members
    }

    /// Returns true if the terminal is a member.
    #[must_use]
    pub fn contains(&self, terminal: TerminalId) -> bool {
        self.members.contains(&terminal)
    }

    /// Number of member terminals.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// Process-wide table of clusters and their memberships.
///
/// Methods take the joining/leaving terminal's handle mutably so the
/// handle's `cluster` field and the membership table can never disagree.
#[derive(Debug, Default)]
pub struct ClusterManager {
    clusters: HashMap<ClusterId, Cluster>,
}

impl ClusterManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a cluster.
    #[must_use]
    pub fn cluster(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.get(&id)
    }

    /// Finds a cluster by display name.
    #[must_use]
    pub fn cluster_named(&self, name: &str) -> Option<&Cluster> {
        self.clusters.values().find(|c| c.name == name)
    }

    /// Number of live clusters.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Iterates over all live clusters, in no particular order.
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.values()
    }

    /// Adds a terminal to a cluster, creating the cluster record when
    /// the id is new. A terminal already in a different cluster leaves
    /// it first; membership is exclusive.
    pub fn join(&mut self, handle: &mut TerminalHandle, cluster: ClusterId, name: &str) {
        if handle.cluster == Some(cluster) {
            return;
        }
        self.leave(handle);

        let entry = self.clusters.entry(cluster).or_insert_with(|| Cluster {
            id: cluster,
            name: name.to_string(),
            members: Vec::new(),
        });
        entry.members.push(handle.id);
        handle.cluster = Some(cluster);
        debug!(terminal = %handle.id, cluster = %cluster, name, "terminal joined cluster");
    }

    /// Removes a terminal from its cluster, deleting the cluster when it
    /// becomes empty. A terminal with no cluster is a no-op.
    pub fn leave(&mut self, handle: &mut TerminalHandle) {
        let Some(cluster) = handle.cluster.take() else {
            return;
        };
        let Some(entry) = self.clusters.get_mut(&cluster) else {
            return;
        };
        entry.members.retain(|id| *id != handle.id);
        debug!(terminal = %handle.id, cluster = %cluster, "terminal left cluster");
        // Empty clusters do not linger.
        if entry.members.is_empty() {
            self.clusters.remove(&cluster);
            debug!(cluster = %cluster, "empty cluster deleted");
        }
    }

    /// Members of the origin's cluster excluding the origin itself, in
    /// broadcast order. Empty when the origin has no cluster or is the
    /// sole member.
    #[must_use]
    pub fn broadcast_targets(&self, origin: &TerminalHandle) -> Vec<TerminalId> {
        let Some(cluster) = origin.cluster.and_then(|id| self.clusters.get(&id)) else {
            return Vec::new();
        };
        cluster
            .members
            .iter()
            .copied()
            .filter(|id| *id != origin.id)
            .collect()
    }

    /// Re-sends a keystroke from one member to every other member's
    /// input stream. The origin keeps its own echo through the normal
    /// path and is never included. Returns the number of terminals the
    /// bytes were delivered to.
    pub fn broadcast_keystroke<I: TerminalInput + ?Sized>(
        &self,
        origin: &TerminalHandle,
        key: &BroadcastKey,
        input: &mut I,
    ) -> usize {
        let Some(bytes) = key.encode() else {
            return 0;
        };
        self.broadcast_bytes(origin, &bytes, input)
    }

    /// Delivers raw bytes to every other member of the origin's cluster.
    pub fn broadcast_bytes<I: TerminalInput + ?Sized>(
        &self,
        origin: &TerminalHandle,
        bytes: &[u8],
        input: &mut I,
    ) -> usize {
        let targets = self.broadcast_targets(origin);
        for target in &targets {
            input.feed_child(*target, bytes);
        }
        targets.len()
    }

    /// Repeats a paste action on every other member of the origin's
    /// cluster. `clipboard` selects clipboard vs. primary selection.
    pub fn broadcast_paste<I: TerminalInput + ?Sized>(
        &self,
        origin: &TerminalHandle,
        clipboard: bool,
        input: &mut I,
    ) -> usize {
        let targets = self.broadcast_targets(origin);
        for target in &targets {
            input.paste(*target, clipboard);
        }
        targets.len()
    }
}
