//! Terminal handles and the factory seam to the terminal-widget layer
//!
//! A [`TerminalHandle`] wraps one live terminal surface owned by exactly one
//! layout leaf. The engine never talks to a PTY directly: handles are
//! created and disposed through the [`TerminalFactory`] collaborator, and
//! input fan-out goes through a [`TerminalInput`] sink. Both seams are
//! implemented by the embedding terminal-widget layer.

use std::fmt;
use std::time::Instant;

use uuid::Uuid;

use crate::cluster::ClusterId;
use crate::config::AppSettings;
use crate::error::{SessionError, SessionResult};
use crate::models::Connection;
use crate::orchestrator::OrchestratorId;

/// Unique identifier for a live terminal surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TerminalId(pub Uuid);

impl TerminalId {
    /// Creates a new random terminal ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TerminalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TerminalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Terminal({})", self.0)
    }
}

/// State record for one live terminal surface.
///
/// A handle is owned by exactly one layout leaf at a time. When its leaf
/// is removed or replaced, cluster membership is revoked first and the
/// handle is then handed back to the factory for disposal.
#[derive(Debug)]
pub struct TerminalHandle {
    /// Unique identifier for this terminal.
    pub id: TerminalId,
    /// Identifier of the connection this terminal was opened for.
    pub connection: Uuid,
    /// Cluster this terminal currently belongs to, if any.
    ///
    /// Kept bidirectionally consistent with the cluster's member set by
    /// [`ClusterManager`](crate::cluster::ClusterManager).
    pub cluster: Option<ClusterId>,
    /// Whether the underlying process is still alive.
    pub connected: bool,
    /// Monotonic timestamp of when the process was spawned. Used by the
    /// restart loop guard.
    pub created_at: Instant,
    /// Dynamically allocated local proxy port, if the command builder
    /// requested one.
    pub proxy_port: Option<u16>,
    /// Whether keystrokes and pastes typed here fan out to the rest of
    /// this terminal's cluster. Seeded from the `broadcast_on_join`
    /// setting when the terminal joins; toggled per terminal afterwards.
    pub broadcast_enabled: bool,
    /// Companion orchestrator process registered for this terminal.
    pub orchestrator: Option<OrchestratorId>,
}

impl TerminalHandle {
    /// Creates a new handle for a freshly spawned terminal.
    #[must_use]
    pub fn new(connection: Uuid, proxy_port: Option<u16>) -> Self {
        Self {
            id: TerminalId::new(),
            connection,
            cluster: None,
            connected: true,
            created_at: Instant::now(),
            proxy_port,
            broadcast_enabled: true,
            orchestrator: None,
        }
    }

    /// Marks the underlying process as exited.
    pub fn mark_disconnected(&mut self) {
        self.connected = false;
    }

    /// Returns how long ago the process was spawned.
    #[must_use]
    pub fn connect_duration(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }
}

/// Factory seam to the external terminal-widget library.
///
/// The engine requests handle creation when a connection is opened (new
/// tab, split, or reconnect) and disposal when a leaf is removed or its
/// terminal replaced. The factory owns PTY spawning and widget teardown.
pub trait TerminalFactory {
    /// Spawns a terminal for the connection and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SpawnFailed`] if the process could not be
    /// started.
    fn create(
        &mut self,
        settings: &AppSettings,
        connection: &Connection,
    ) -> SessionResult<TerminalHandle>;

    /// Tears down the terminal surface behind a disposed handle.
    fn dispose(&mut self, handle: TerminalHandle);
}

/// Input sink for delivering bytes to a terminal.
///
/// Cluster broadcast and orchestrator `feed-child`/`feed` actions are
/// routed through this seam; the embedding layer maps terminal IDs to the
/// actual widget input/display streams.
pub trait TerminalInput {
    /// Writes bytes to the terminal's input stream (as if typed).
    fn feed_child(&mut self, terminal: TerminalId, bytes: &[u8]);

    /// Writes bytes to the terminal's display output (not its input).
    fn feed_display(&mut self, terminal: TerminalId, bytes: &[u8]);

    /// Performs a paste action on the terminal.
    fn paste(&mut self, terminal: TerminalId, clipboard: bool);
}

/// Looks up a handle or reports the terminal as unknown.
///
/// Shared helper for call sites that must fail loudly in development and
/// defensively in release.
pub(crate) fn handle_or_err<'a>(
    handles: &'a std::collections::HashMap<TerminalId, TerminalHandle>,
    terminal: TerminalId,
) -> SessionResult<&'a TerminalHandle> {
    debug_assert!(handles.contains_key(&terminal), "unknown terminal {terminal}");
    handles
        .get(&terminal)
        .ok_or_else(|| SessionError::NotFound(terminal.to_string()))
}
