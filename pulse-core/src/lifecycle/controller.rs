//! Session context: the top-level coordinator
//!
//! Owns the process-wide singletons (layout engine, cluster table,
//! terminal handles, session monitors, history log) and sequences every
//! multi-component operation so the invariants hold at each step:
//! cluster membership is revoked before a leaf is removed, handles are
//! disposed after the tree no longer references them, and a replacement
//! spawn inherits the cluster and pane of the terminal it replaces.

use std::collections::HashMap;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::state::{
    DisconnectBehavior, DisconnectDecision, SessionMonitor, SessionState, WaitKeyAction,
    WaitKeyInput,
};
use crate::cluster::{BroadcastKey, ClusterId, ClusterManager};
use crate::config::AppSettings;
use crate::error::{SessionError, SessionResult};
use crate::history::HistoryLog;
use crate::layout::{
    CloseOutcome, LayoutEngine, NodeId, Orientation, SplitContent, SplitMode, TabId, WorkspaceId,
    grid_subtree,
};
use crate::models::{Connection, ConnectionKind, HistoryEntry};
use crate::orchestrator::OrchestratorId;
use crate::terminal::{TerminalFactory, TerminalHandle, TerminalId, TerminalInput, handle_or_err};

/// Where the new content of a split comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitSource {
    /// A fresh terminal to the same connection as the split target.
    SameConnection,
    /// A fresh terminal to a specific connection.
    Connection(Uuid),
    /// Another tab's entire content; that tab is closed.
    MergeTab(TabId),
}

/// Outcome of a close request that may need user confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseRequest {
    /// The close was performed.
    Done(CloseOutcome),
    /// The target is still connected; nothing was changed. The caller
    /// asks the user and retries with `confirmed = true`.
    ConfirmationRequired,
}

/// What happened in response to a process exit or waiting-pane key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The terminal was closed.
    Closed(CloseOutcome),
    /// The terminal was replaced by a fresh spawn in the same pane.
    Restarted {
        /// The replacement terminal.
        replacement: TerminalId,
    },
    /// The dead pane stays on screen waiting for Enter or Escape.
    /// `loop_guarded` marks a restart policy demoted because the
    /// process died too quickly; the embedding shows a notification.
    WaitingForKey {
        /// True when the restart loop guard triggered.
        loop_guarded: bool,
    },
}

/// Signal emitted when terminal output is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEvent {
    /// Nothing of interest.
    None,
    /// A prompt appeared for the first time. `post_connect` is set for
    /// remote connection types: the embedding notifies the post-connect
    /// collaborator and returns focus to this terminal.
    PromptReady {
        /// Whether the post-connect collaborator should run.
        post_connect: bool,
    },
}

/// Top-level session state, constructed at startup and torn down at
/// shutdown. All engine components are reached through it.
#[derive(Debug)]
pub struct SessionContext<F: TerminalFactory> {
    settings: AppSettings,
    factory: F,
    connections: HashMap<Uuid, Connection>,
    layout: LayoutEngine,
    clusters: ClusterManager,
    handles: HashMap<TerminalId, TerminalHandle>,
    monitors: HashMap<TerminalId, SessionMonitor>,
    history: HistoryLog,
}

impl<F: TerminalFactory> SessionContext<F> {
    /// Creates a context with one empty primary workspace.
    #[must_use]
    pub fn new(settings: AppSettings, factory: F) -> Self {
        Self {
            settings,
            factory,
            connections: HashMap::new(),
            layout: LayoutEngine::new(),
            clusters: ClusterManager::new(),
            handles: HashMap::new(),
            monitors: HashMap::new(),
            history: HistoryLog::new(),
        }
    }

    /// Active settings.
    #[must_use]
    pub const fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Read access to the layout engine.
    #[must_use]
    pub const fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    /// Read access to the cluster table.
    #[must_use]
    pub const fn clusters(&self) -> &ClusterManager {
        &self.clusters
    }

    /// Read access to the history log.
    #[must_use]
    pub const fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Records a history entry for a connection.
    pub fn record_history(&mut self, connection: Uuid, entry: HistoryEntry) {
        self.history.record(connection, entry);
    }

    /// Registers a connection from the external store.
    pub fn add_connection(&mut self, connection: Connection) {
        self.connections.insert(connection.id, connection);
    }

    /// Looks up a registered connection.
    #[must_use]
    pub fn connection(&self, id: Uuid) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Looks up a live terminal handle.
    #[must_use]
    pub fn handle(&self, terminal: TerminalId) -> Option<&TerminalHandle> {
        self.handles.get(&terminal)
    }

    /// Lifecycle state of a terminal, if it is live.
    #[must_use]
    pub fn state_of(&self, terminal: TerminalId) -> Option<SessionState> {
        self.monitors.get(&terminal).map(SessionMonitor::state)
    }

    /// The connection a terminal was opened for.
    #[must_use]
    pub fn connection_of(&self, terminal: TerminalId) -> Option<&Connection> {
        let handle = self.handles.get(&terminal)?;
        self.connections.get(&handle.connection)
    }

    fn spawn_handle(&mut self, connection: Uuid) -> SessionResult<TerminalId> {
        let conn = self
            .connections
            .get(&connection)
            .ok_or(SessionError::ConnectionNotFound(connection))?;
        let handle = self.factory.create(&self.settings, conn)?;
        let id = handle.id;
        self.handles.insert(id, handle);
        let mut monitor = SessionMonitor::new();
        monitor.spawned();
        self.monitors.insert(id, monitor);
        debug!(terminal = %id, %connection, "terminal spawned");
        Ok(id)
    }

    /// Opens a connection in a new tab. `workspace` defaults to the
    /// primary workspace.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ConnectionNotFound`] or a spawn failure.
    pub fn open_connection(
        &mut self,
        connection: Uuid,
        workspace: Option<WorkspaceId>,
    ) -> SessionResult<(TabId, TerminalId)> {
        let terminal = self.spawn_handle(connection)?;
        let ws = workspace.unwrap_or_else(|| self.layout.primary_workspace());
        match self.layout.open_tab(ws, terminal) {
            Ok(tab) => Ok((tab, terminal)),
            Err(err) => {
                self.discard_spawn(terminal);
                Err(err.into())
            }
        }
    }

    /// Opens a connection in a new tab and joins the terminal to a
    /// cluster in one step.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotClusterable`] when the connection
    /// opts out of clustering; propagates open failures.
    pub fn open_connection_clustered(
        &mut self,
        connection: Uuid,
        workspace: Option<WorkspaceId>,
        cluster: ClusterId,
        name: &str,
    ) -> SessionResult<(TabId, TerminalId)> {
        let (tab, terminal) = self.open_connection(connection, workspace)?;
        if let Err(err) = self.join_cluster(terminal, cluster, name) {
            self.force_close(terminal)?;
            return Err(err);
        }
        Ok((tab, terminal))
    }

    /// Opens several connections at once in one tab, arranged as a
    /// near-square grid of splits.
    ///
    /// # Errors
    ///
    /// Fails on an empty list, an unknown connection, or a spawn
    /// failure; terminals spawned before the failure are disposed.
    pub fn open_connections_grid(
        &mut self,
        connections: &[Uuid],
        workspace: Option<WorkspaceId>,
    ) -> SessionResult<(TabId, Vec<TerminalId>)> {
        if connections.is_empty() {
            return Err(SessionError::NotFound("no connections to open".to_string()));
        }
        let mut terminals = Vec::with_capacity(connections.len());
        for connection in connections {
            match self.spawn_handle(*connection) {
                Ok(terminal) => terminals.push(terminal),
                Err(err) => {
                    for terminal in terminals {
                        self.discard_spawn(terminal);
                    }
                    return Err(err);
                }
            }
        }

        let content = grid_subtree(&terminals)
            .ok_or_else(|| SessionError::NotFound("no terminals spawned".to_string()))?;
        let ws = workspace.unwrap_or_else(|| self.layout.primary_workspace());
        match self.layout.open_tab_from_subtree(ws, content) {
            Ok(tab) => {
                info!(tab = %tab, count = terminals.len(), "grid tab opened");
                Ok((tab, terminals))
            }
            Err(err) => {
                for terminal in terminals {
                    self.discard_spawn(terminal);
                }
                Err(err.into())
            }
        }
    }

    /// Undoes a spawn whose layout insertion failed.
    fn discard_spawn(&mut self, terminal: TerminalId) {
        self.monitors.remove(&terminal);
        if let Some(handle) = self.handles.remove(&terminal) {
            self.factory.dispose(handle);
        }
    }

    /// Splits a pane or the whole tab. `target` is the terminal whose
    /// pane is divided; `mode` defaults to the configured split mode,
    /// and a missing target forces a whole-tab split. The new content
    /// comes from `source`.
    ///
    /// Returns the new split node.
    ///
    /// # Errors
    ///
    /// Propagates spawn and layout failures; a spawned terminal is
    /// disposed again when the layout operation fails.
    pub fn split(
        &mut self,
        tab: TabId,
        target: Option<TerminalId>,
        orientation: Orientation,
        source: SplitSource,
        mode: Option<SplitMode>,
    ) -> SessionResult<NodeId> {
        let mode = mode.unwrap_or(self.settings.default_split_mode);
        let (content, spawned) = match source {
            SplitSource::MergeTab(donor) => (SplitContent::TabContent(donor), None),
            SplitSource::Connection(connection) => {
                let terminal = self.spawn_handle(connection)?;
                (SplitContent::Terminal(terminal), Some(terminal))
            }
            SplitSource::SameConnection => {
                // With no target, the tab's first pane donates its
                // connection.
                let anchor = match target {
                    Some(terminal) => terminal,
                    None => self
                        .layout
                        .tab(tab)
                        .and_then(|t| t.arena().first_terminal())
                        .ok_or(crate::layout::LayoutError::TabNotFound(tab))?,
                };
                let connection = handle_or_err(&self.handles, anchor)?.connection;
                let terminal = self.spawn_handle(connection)?;
                (SplitContent::Terminal(terminal), Some(terminal))
            }
        };

        match self.layout.split(tab, target, orientation, content, mode) {
            Ok(node) => Ok(node),
            Err(err) => {
                if let Some(terminal) = spawned {
                    self.discard_spawn(terminal);
                }
                Err(err.into())
            }
        }
    }

    /// Moves the sibling of a pane out into a brand-new tab.
    ///
    /// # Errors
    ///
    /// Propagates layout failures.
    pub fn unsplit(&mut self, terminal: TerminalId) -> SessionResult<TabId> {
        Ok(self.layout.unsplit(terminal)?)
    }

    /// Closes a terminal. A still-connected terminal requires
    /// `confirmed = true`; otherwise nothing changes and the caller is
    /// asked to confirm.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for an unknown terminal.
    pub fn close_terminal(
        &mut self,
        terminal: TerminalId,
        confirmed: bool,
    ) -> SessionResult<CloseRequest> {
        let handle = handle_or_err(&self.handles, terminal)?;
        if handle.connected && !confirmed {
            return Ok(CloseRequest::ConfirmationRequired);
        }
        Ok(CloseRequest::Done(self.force_close(terminal)?))
    }

    /// Closes a whole tab. Requires confirmation when any member is
    /// still connected.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Layout`] for an unknown tab.
    pub fn close_tab(&mut self, tab: TabId, confirmed: bool) -> SessionResult<CloseRequest> {
        let terminals = self.layout.terminals_in_tab(tab)?;
        let any_connected = terminals
            .iter()
            .any(|t| self.handles.get(t).is_some_and(|h| h.connected));
        if any_connected && !confirmed {
            return Ok(CloseRequest::ConfirmationRequired);
        }
        let mut last = CloseOutcome::SiblingPromoted;
        for terminal in terminals {
            last = self.force_close(terminal)?;
        }
        Ok(CloseRequest::Done(last))
    }

    /// Cluster membership first, then the tree, then the handle.
    fn force_close(&mut self, terminal: TerminalId) -> SessionResult<CloseOutcome> {
        if let Some(handle) = self.handles.get_mut(&terminal) {
            self.clusters.leave(handle);
        }
        self.monitors.remove(&terminal);
        let outcome = self.layout.close_terminal(terminal)?;
        if let Some(handle) = self.handles.remove(&terminal) {
            self.factory.dispose(handle);
        }
        debug!(terminal = %terminal, ?outcome, "terminal closed");
        Ok(outcome)
    }

    /// Feeds the last visible output line of a terminal into prompt
    /// detection.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for an unknown terminal.
    pub fn observe_output(
        &mut self,
        terminal: TerminalId,
        last_line: &str,
    ) -> SessionResult<OutputEvent> {
        let handle = handle_or_err(&self.handles, terminal)?;
        let remote = self
            .connections
            .get(&handle.connection)
            .is_some_and(|c| c.kind.is_remote());
        let monitor = self
            .monitors
            .get_mut(&terminal)
            .ok_or_else(|| SessionError::NotFound(terminal.to_string()))?;
        if monitor.observe_output(last_line) {
            info!(terminal = %terminal, "prompt detected");
            return Ok(OutputEvent::PromptReady {
                post_connect: remote,
            });
        }
        Ok(OutputEvent::None)
    }

    /// Handles the exit of a terminal's process according to the
    /// configured disconnect behavior.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for an unknown terminal, and
    /// propagates spawn failures of a restart.
    pub fn process_exited(&mut self, terminal: TerminalId) -> SessionResult<LifecycleEvent> {
        let handle = self
            .handles
            .get_mut(&terminal)
            .ok_or_else(|| SessionError::NotFound(terminal.to_string()))?;
        handle.mark_disconnected();
        let connected_for = handle.connect_duration();

        let behavior: DisconnectBehavior = self.settings.on_disconnect_behavior;
        let monitor = self
            .monitors
            .get_mut(&terminal)
            .ok_or_else(|| SessionError::NotFound(terminal.to_string()))?;
        match monitor.process_exited(connected_for, behavior) {
            DisconnectDecision::Close => Ok(LifecycleEvent::Closed(self.force_close(terminal)?)),
            DisconnectDecision::Restart => {
                let replacement = self.respawn(terminal)?;
                Ok(LifecycleEvent::Restarted { replacement })
            }
            DisconnectDecision::WaitForKey { loop_guarded } => {
                if loop_guarded {
                    warn!(terminal = %terminal, "process exited too quickly, not restarting");
                }
                Ok(LifecycleEvent::WaitingForKey { loop_guarded })
            }
        }
    }

    /// Handles Enter/Escape on a pane waiting after a disconnect. Other
    /// keys are swallowed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for an unknown terminal, and
    /// propagates spawn failures of a restart.
    pub fn wait_key(
        &mut self,
        terminal: TerminalId,
        key: WaitKeyInput,
    ) -> SessionResult<Option<LifecycleEvent>> {
        let monitor = self
            .monitors
            .get_mut(&terminal)
            .ok_or_else(|| SessionError::NotFound(terminal.to_string()))?;
        match monitor.key_while_waiting(key) {
            None => Ok(None),
            Some(WaitKeyAction::Replace) => {
                let replacement = self.respawn(terminal)?;
                Ok(Some(LifecycleEvent::Restarted { replacement }))
            }
            Some(WaitKeyAction::Close) => {
                Ok(Some(LifecycleEvent::Closed(self.force_close(terminal)?)))
            }
        }
    }

    /// Replaces a terminal with a fresh spawn to the same connection.
    /// The pane, split ratios, and cluster membership carry over.
    fn respawn(&mut self, terminal: TerminalId) -> SessionResult<TerminalId> {
        let old = self
            .handles
            .remove(&terminal)
            .ok_or_else(|| SessionError::NotFound(terminal.to_string()))?;
        let conn = match self.connections.get(&old.connection) {
            Some(conn) => conn,
            None => {
                let id = old.connection;
                self.handles.insert(terminal, old);
                return Err(SessionError::ConnectionNotFound(id));
            }
        };
        let cluster = old
            .cluster
            .and_then(|id| self.clusters.cluster(id).map(|c| (id, c.name.clone())));

        let mut new = match self.factory.create(&self.settings, conn) {
            Ok(handle) => handle,
            Err(err) => {
                // Spawn failed: the dead pane stays as it was.
                self.handles.insert(terminal, old);
                return Err(err);
            }
        };

        let mut old = old;
        self.clusters.leave(&mut old);
        if let Some((id, name)) = cluster {
            self.clusters.join(&mut new, id, &name);
            new.broadcast_enabled = old.broadcast_enabled;
        }

        let new_id = new.id;
        self.layout.replace_terminal(terminal, new_id)?;
        self.monitors.remove(&terminal);
        let mut monitor = SessionMonitor::new();
        monitor.spawned();
        self.monitors.insert(new_id, monitor);
        self.handles.insert(new_id, new);
        self.factory.dispose(old);
        info!(old = %terminal, new = %new_id, "terminal restarted in place");
        Ok(new_id)
    }

    /// Adds a terminal to a cluster, creating it on first join.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotClusterable`] when the terminal's
    /// connection opts out of clustering.
    pub fn join_cluster(
        &mut self,
        terminal: TerminalId,
        cluster: ClusterId,
        name: &str,
    ) -> SessionResult<()> {
        let handle = handle_or_err(&self.handles, terminal)?;
        let connection = handle.connection;
        let clusterable = self
            .connections
            .get(&connection)
            .is_none_or(|c| c.clusterable);
        if !clusterable {
            return Err(SessionError::NotClusterable(connection));
        }
        let broadcast = self.settings.broadcast_on_join;
        let handle = self
            .handles
            .get_mut(&terminal)
            .ok_or_else(|| SessionError::NotFound(terminal.to_string()))?;
        self.clusters.join(handle, cluster, name);
        handle.broadcast_enabled = broadcast;
        Ok(())
    }

    /// Turns keystroke/paste fan-out from a terminal on or off without
    /// touching its cluster membership.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for an unknown terminal.
    pub fn set_broadcast(&mut self, terminal: TerminalId, enabled: bool) -> SessionResult<()> {
        let handle = self
            .handles
            .get_mut(&terminal)
            .ok_or_else(|| SessionError::NotFound(terminal.to_string()))?;
        handle.broadcast_enabled = enabled;
        Ok(())
    }

    /// Removes a terminal from its cluster, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for an unknown terminal.
    pub fn leave_cluster(&mut self, terminal: TerminalId) -> SessionResult<()> {
        let handle = self
            .handles
            .get_mut(&terminal)
            .ok_or_else(|| SessionError::NotFound(terminal.to_string()))?;
        self.clusters.leave(handle);
        Ok(())
    }

    /// Adds every clusterable terminal of a tab to a cluster. Returns
    /// how many joined.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Layout`] for an unknown tab.
    pub fn join_tab_to_cluster(
        &mut self,
        tab: TabId,
        cluster: ClusterId,
        name: &str,
    ) -> SessionResult<usize> {
        let mut joined = 0;
        for terminal in self.layout.terminals_in_tab(tab)? {
            match self.join_cluster(terminal, cluster, name) {
                Ok(()) => joined += 1,
                Err(SessionError::NotClusterable(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(joined)
    }

    /// Fans a keystroke out to the other members of the origin's
    /// cluster. Only a `Ready` terminal with fan-out enabled
    /// broadcasts. Returns the number of terminals reached.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for an unknown origin.
    pub fn keystroke<I: TerminalInput + ?Sized>(
        &mut self,
        origin: TerminalId,
        key: &BroadcastKey,
        input: &mut I,
    ) -> SessionResult<usize> {
        if self.state_of(origin) != Some(SessionState::Ready) {
            return Ok(0);
        }
        let handle = handle_or_err(&self.handles, origin)?;
        if !handle.broadcast_enabled {
            return Ok(0);
        }
        Ok(self.clusters.broadcast_keystroke(handle, key, input))
    }

    /// Repeats a paste on the other members of the origin's cluster.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for an unknown origin.
    pub fn paste<I: TerminalInput + ?Sized>(
        &mut self,
        origin: TerminalId,
        clipboard: bool,
        input: &mut I,
    ) -> SessionResult<usize> {
        if self.state_of(origin) != Some(SessionState::Ready) {
            return Ok(0);
        }
        let handle = handle_or_err(&self.handles, origin)?;
        if !handle.broadcast_enabled {
            return Ok(0);
        }
        Ok(self.clusters.broadcast_paste(handle, clipboard, input))
    }

    /// Runs a command on every member of a cluster. The command is a
    /// template; each member receives it with its own connection
    /// variables substituted, followed by a newline. Each delivery is
    /// logged to the history of the member's connection. Returns how
    /// many terminals received the command.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for an unknown cluster.
    pub fn run_cluster_command<I: TerminalInput + ?Sized>(
        &mut self,
        cluster: ClusterId,
        template: &str,
        input: &mut I,
    ) -> SessionResult<usize> {
        let members = self
            .clusters
            .cluster(cluster)
            .ok_or_else(|| SessionError::NotFound(format!("cluster {cluster}")))?
            .members()
            .to_vec();
        let mut delivered = 0;
        for terminal in members {
            let Some(handle) = self.handles.get(&terminal) else {
                continue;
            };
            let Some(conn) = self.connections.get(&handle.connection) else {
                continue;
            };
            let command = crate::variables::substitute(template, conn, handle.proxy_port);
            input.feed_child(terminal, format!("{command}\n").as_bytes());
            self.history
                .record(handle.connection, HistoryEntry::success(&command, ""));
            delivered += 1;
        }
        debug!(cluster = %cluster, delivered, "cluster command dispatched");
        Ok(delivered)
    }

    /// Registers the companion orchestrator process started for a
    /// terminal and returns its id. Called by the embedding when the
    /// post-connect hook starts the protocol pump.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for an unknown terminal.
    pub fn attach_orchestrator(&mut self, terminal: TerminalId) -> SessionResult<OrchestratorId> {
        let handle = self
            .handles
            .get_mut(&terminal)
            .ok_or_else(|| SessionError::NotFound(terminal.to_string()))?;
        let id = OrchestratorId::new();
        handle.orchestrator = Some(id);
        debug!(terminal = %terminal, orchestrator = %id, "orchestrator attached");
        Ok(id)
    }

    /// Clears a terminal's orchestrator registration when the pump
    /// ends, returning the id that was attached.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for an unknown terminal.
    pub fn detach_orchestrator(
        &mut self,
        terminal: TerminalId,
    ) -> SessionResult<Option<OrchestratorId>> {
        let handle = self
            .handles
            .get_mut(&terminal)
            .ok_or_else(|| SessionError::NotFound(terminal.to_string()))?;
        Ok(handle.orchestrator.take())
    }

    /// Opens an SFTP session derived from an existing terminal's
    /// connection, in a new tab.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for an unknown terminal.
    pub fn open_sftp_for(&mut self, terminal: TerminalId) -> SessionResult<(TabId, TerminalId)> {
        let handle = handle_or_err(&self.handles, terminal)?;
        let conn = self
            .connections
            .get(&handle.connection)
            .ok_or(SessionError::ConnectionNotFound(handle.connection))?;
        let sftp = conn.clone_as(ConnectionKind::Sftp);
        let id = sftp.id;
        self.connections.insert(id, sftp);
        self.open_connection(id, None)
    }

    /// Moves a tab to another workspace, or detaches it into a new one.
    ///
    /// # Errors
    ///
    /// Propagates layout failures.
    pub fn move_tab(
        &mut self,
        tab: TabId,
        target: Option<WorkspaceId>,
    ) -> SessionResult<WorkspaceId> {
        Ok(self.layout.move_tab(tab, target)?)
    }

    /// Display title for a tab: explicit override or the unique member
    /// connection names joined with " + ".
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Layout`] for an unknown tab.
    pub fn tab_title(&self, tab: TabId) -> SessionResult<String> {
        let title = self.layout.tab_title(tab, |terminal| {
            self.handles
                .get(&terminal)
                .and_then(|h| self.connections.get(&h.connection))
                .map(|c| c.name.clone())
        })?;
        Ok(title)
    }

    /// Connection status summary for a tab: how many member terminals
    /// are still connected out of how many panes.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Layout`] for an unknown tab.
    pub fn tab_connection_status(&self, tab: TabId) -> SessionResult<(usize, usize)> {
        let terminals = self.layout.terminals_in_tab(tab)?;
        let connected = terminals
            .iter()
            .filter(|t| self.handles.get(t).is_some_and(|h| h.connected))
            .count();
        Ok((connected, terminals.len()))
    }
}
