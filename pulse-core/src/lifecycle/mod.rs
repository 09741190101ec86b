//! Session lifecycle: prompt detection, disconnect policy, and the
//! top-level session context.

mod controller;
mod state;

pub use controller::{
    CloseRequest, LifecycleEvent, OutputEvent, SessionContext, SplitSource,
};
pub use state::{
    DisconnectBehavior, DisconnectDecision, PROMPT_SENTINELS, RESTART_LOOP_WINDOW, SessionMonitor,
    SessionState, WAIT_FOR_KEY_BANNER, WaitKeyAction, WaitKeyInput, prompt_detected,
};
