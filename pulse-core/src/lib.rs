//! `PulseCore` — layout and cluster engine for a terminal-session manager
//!
//! This crate implements the mutable state behind a tabbed, splittable
//! terminal-session manager: the per-tab binary layout tree, named
//! clusters whose keystrokes fan out across terminals, and the session
//! lifecycle from spawn through prompt detection to disconnect policy.
//!
//! # Crate Structure
//!
//! - [`models`] - Connection profiles and history entries
//! - [`config`] - Application settings read by the engine
//! - [`layout`] - Workspaces, tabs, and the per-tab split tree
//! - [`cluster`] - Named groups with keystroke/paste broadcast
//! - [`lifecycle`] - Prompt detection, disconnect policy, session context
//! - [`terminal`] - Terminal handles and the widget-layer seams
//! - [`orchestrator`] - Line-JSON protocol for companion scripts
//! - [`command`] / [`variables`] - Invocation and substitution seams
//! - [`history`] - Per-connection command history
//!
//! Rendering, PTY handling, and persistence live in the embedding layer;
//! this crate holds the state machines and the seams to reach them.

#![warn(missing_docs)]

pub mod cluster;
pub mod command;
pub mod config;
pub mod error;
pub mod history;
pub mod layout;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod terminal;
pub mod variables;

// =============================================================================
// Convenience re-exports
//
// Flat re-exports for the embedding layer and the property tests; new
// code can also import via the modular paths.
// =============================================================================

pub use cluster::{BroadcastKey, Cluster, ClusterId, ClusterManager};
pub use command::{CommandBuilder, SpawnCommand};
pub use config::AppSettings;
pub use error::{SessionError, SessionResult};
pub use history::HistoryLog;
pub use layout::{
    CloseOutcome, LayoutEngine, LayoutError, LayoutNode, LayoutResult, NodeId, Orientation,
    SplitContent, SplitMode, Subtree, TabArena, TabId, WorkspaceId, grid_shape, grid_subtree,
};
pub use lifecycle::{
    CloseRequest, DisconnectBehavior, LifecycleEvent, OutputEvent, SessionContext, SessionMonitor,
    SessionState, SplitSource, WAIT_FOR_KEY_BANNER, WaitKeyAction, WaitKeyInput, prompt_detected,
};
pub use models::{Connection, ConnectionKind, HistoryEntry};
pub use orchestrator::{
    LineDisposition, OrchestratorAction, OrchestratorHost, OrchestratorId, classify_line,
    handle_line,
};
pub use terminal::{TerminalFactory, TerminalHandle, TerminalId, TerminalInput};
