//! Application settings read by the engine.
//!
//! The engine does not load or persist settings itself; the external
//! configuration store hands a deserialized [`AppSettings`] in at
//! startup. Every field has a default so partial configurations load.

use serde::{Deserialize, Serialize};

use crate::layout::SplitMode;
use crate::lifecycle::DisconnectBehavior;

/// Settings consulted by the layout and lifecycle components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Shell program for local terminals.
    pub shell_program: String,
    /// What a split divides when the user does not pick a pane mode.
    pub default_split_mode: SplitMode,
    /// What happens when a terminal's process exits.
    pub on_disconnect_behavior: DisconnectBehavior,
    /// Whether a terminal that joins a cluster starts with keystroke
    /// fan-out enabled. Toggled per terminal afterwards.
    pub broadcast_on_join: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            shell_program: "bash".to_string(),
            default_split_mode: SplitMode::WholeTab,
            on_disconnect_behavior: DisconnectBehavior::WaitForKey,
            broadcast_on_join: true,
        }
    }
}
