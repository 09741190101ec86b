//! Per-terminal session state machine
//!
//! Tracks one terminal from spawn through prompt detection to
//! disconnect handling:
//!
//! ```text
//! Spawning -> AwaitingPrompt -> Ready -> Disconnected
//!                                          |-> Closed
//!                                          |-> Restarting -> Spawning
//!                                          `-> WaitingForKey
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A process that respawns faster than this after connecting is treated
/// as a restart loop and degrades to waiting for a key.
pub const RESTART_LOOP_WINDOW: Duration = Duration::from_secs(5);

/// Characters that, as the final character of the last output line, are
/// taken to mean an interactive shell prompt has appeared.
pub const PROMPT_SENTINELS: [char; 4] = ['$', '#', '>', '%'];

/// Fixed message shown on a dead pane in the waiting-for-key state.
pub const WAIT_FOR_KEY_BANNER: &str =
    "\r\n[session ended: press Enter to reconnect, Esc to close]\r\n";

/// Returns true if the last visible output line ends in a prompt
/// sentinel, ignoring trailing whitespace.
#[must_use]
pub fn prompt_detected(last_line: &str) -> bool {
    last_line
        .trim_end()
        .chars()
        .next_back()
        .is_some_and(|c| PROMPT_SENTINELS.contains(&c))
}

/// Configured reaction to a terminal's process exiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectBehavior {
    /// Close the terminal immediately.
    Close,
    /// Respawn in place, keeping the pane and cluster membership.
    Restart,
    /// Keep the dead pane and wait for Enter (restart) or Escape
    /// (close).
    #[default]
    WaitForKey,
}

/// Lifecycle state of one terminal session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Process requested from the terminal widget, no output yet.
    Spawning,
    /// Output is monitored for a prompt sentinel.
    AwaitingPrompt,
    /// Interactive use.
    Ready,
    /// The process exited; disposition not yet chosen.
    Disconnected,
    /// Dead pane kept on screen, waiting for Enter or Escape.
    WaitingForKey,
    /// A replacement process is being spawned.
    Restarting,
    /// The terminal has been closed.
    Closed,
}

/// What the controller must do after a process exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectDecision {
    /// Close the terminal.
    Close,
    /// Replace the terminal with a fresh spawn.
    Restart,
    /// Hold the dead pane and wait for a key. `loop_guarded` is set
    /// when a restart policy was demoted because the process died
    /// within [`RESTART_LOOP_WINDOW`] of connecting; the user should be
    /// notified.
    WaitForKey {
        /// True when this replaces a restart that would have looped.
        loop_guarded: bool,
    },
}

/// Key pressed on a pane in the waiting-for-key state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitKeyInput {
    /// Restart the session in place.
    Enter,
    /// Close the terminal.
    Escape,
    /// Anything else; swallowed, never forwarded to the dead session.
    Other,
}

/// Action the controller takes in response to a waiting-for-key input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitKeyAction {
    /// Replace the terminal with a fresh spawn.
    Replace,
    /// Close the terminal.
    Close,
}

/// State machine instance for one terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionMonitor {
    state: SessionState,
}

impl SessionMonitor {
    /// Starts in `Spawning`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SessionState::Spawning,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// The process has been handed to the widget; output monitoring
    /// begins.
    pub fn spawned(&mut self) {
        if matches!(self.state, SessionState::Spawning | SessionState::Restarting) {
            self.state = SessionState::AwaitingPrompt;
        }
    }

    /// Feeds the last visible output line. Returns true exactly once,
    /// on the transition into `Ready`; detection stops afterwards.
    pub fn observe_output(&mut self, last_line: &str) -> bool {
        if self.state == SessionState::AwaitingPrompt && prompt_detected(last_line) {
            self.state = SessionState::Ready;
            return true;
        }
        false
    }

    /// The underlying process exited. `connected_for` is how long it
    /// lived; `behavior` is the configured reaction. Returns what the
    /// controller must do, with the restart loop guard applied.
    pub fn process_exited(
        &mut self,
        connected_for: Duration,
        behavior: DisconnectBehavior,
    ) -> DisconnectDecision {
        self.state = SessionState::Disconnected;
        let decision = match behavior {
            DisconnectBehavior::Close => DisconnectDecision::Close,
            DisconnectBehavior::Restart => {
                if connected_for < RESTART_LOOP_WINDOW {
                    DisconnectDecision::WaitForKey { loop_guarded: true }
                } else {
                    DisconnectDecision::Restart
                }
            }
            DisconnectBehavior::WaitForKey => DisconnectDecision::WaitForKey {
                loop_guarded: false,
            },
        };
        self.state = match decision {
            DisconnectDecision::Close => SessionState::Closed,
            DisconnectDecision::Restart => SessionState::Restarting,
            DisconnectDecision::WaitForKey { .. } => SessionState::WaitingForKey,
        };
        decision
    }

    /// Handles a key on a pane in `WaitingForKey`. Any other state, or
    /// any key besides Enter/Escape, is ignored.
    pub fn key_while_waiting(&mut self, key: WaitKeyInput) -> Option<WaitKeyAction> {
        if self.state != SessionState::WaitingForKey {
            return None;
        }
        match key {
            WaitKeyInput::Enter => {
                self.state = SessionState::Restarting;
                Some(WaitKeyAction::Replace)
            }
            WaitKeyInput::Escape => {
                self.state = SessionState::Closed;
                Some(WaitKeyAction::Close)
            }
            WaitKeyInput::Other => None,
        }
    }
}

impl Default for SessionMonitor {
    fn default() -> Self {
        Self::new()
    }
}
