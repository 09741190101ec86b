//! Property-based tests for the session lifecycle
//!
//! Validates prompt detection, the disconnect state machine, and the
//! restart loop guard end to end through the session context.

use std::time::Duration;

use proptest::prelude::*;
use pulse_core::{
    AppSettings, CloseOutcome, CloseRequest, Connection, DisconnectBehavior, LifecycleEvent,
    Orientation, SessionContext, SessionMonitor, SessionResult, SessionState, SplitSource,
    TerminalFactory, TerminalHandle, WaitKeyInput, prompt_detected,
};
use pulse_core::lifecycle::DisconnectDecision;

/// Factory that fabricates handles without any real PTY.
#[derive(Debug, Default)]
struct FakeFactory {
    disposed: usize,
}

impl TerminalFactory for FakeFactory {
    fn create(
        &mut self,
        _settings: &AppSettings,
        connection: &Connection,
    ) -> SessionResult<TerminalHandle> {
        Ok(TerminalHandle::new(connection.id, None))
    }

    fn dispose(&mut self, _handle: TerminalHandle) {
        self.disposed += 1;
    }
}

fn context(behavior: DisconnectBehavior) -> (SessionContext<FakeFactory>, uuid::Uuid) {
    let settings = AppSettings {
        on_disconnect_behavior: behavior,
        ..AppSettings::default()
    };
    let mut ctx = SessionContext::new(settings, FakeFactory::default());
    let conn = Connection::ssh("web01", "web01.example.com");
    let id = conn.id;
    ctx.add_connection(conn);
    (ctx, id)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A line ending in a prompt sentinel is detected regardless of
    /// trailing whitespace; any other final character is not.
    #[test]
    fn prompt_detection_ignores_trailing_whitespace(
        prefix in "[a-zA-Z0-9@:~/ ]{0,30}",
        sentinel in prop::sample::select(vec!['$', '#', '>', '%']),
        padding in "[ \t]{0,5}",
    ) {
        let line = format!("{prefix}{sentinel}{padding}");
        prop_assert!(prompt_detected(&line));
    }

    #[test]
    fn non_sentinel_endings_are_not_prompts(
        prefix in "[a-zA-Z0-9 ]{0,30}",
        last in proptest::char::range('a', 'z'),
    ) {
        let line = format!("{prefix}{last}");
        prop_assert!(!prompt_detected(&line));
    }

    /// Under the restart policy, an exit inside the 5-second window
    /// degrades to waiting for a key; a later exit restarts.
    #[test]
    fn restart_window_splits_decisions(millis in 0u64..20_000) {
        let mut monitor = SessionMonitor::new();
        monitor.spawned();
        monitor.observe_output("$");

        let decision = monitor.process_exited(
            Duration::from_millis(millis),
            DisconnectBehavior::Restart,
        );
        if millis < 5_000 {
            prop_assert_eq!(
                decision,
                DisconnectDecision::WaitForKey { loop_guarded: true }
            );
            prop_assert_eq!(monitor.state(), SessionState::WaitingForKey);
        } else {
            prop_assert_eq!(decision, DisconnectDecision::Restart);
            prop_assert_eq!(monitor.state(), SessionState::Restarting);
        }
    }

    /// Whatever the configured behavior, handling an exit never leaves
    /// the monitor in `Disconnected`: each exit lands in a terminal
    /// disposition.
    #[test]
    fn exit_always_resolves_to_a_disposition(
        millis in 0u64..20_000,
        behavior in prop::sample::select(vec![
            DisconnectBehavior::Close,
            DisconnectBehavior::Restart,
            DisconnectBehavior::WaitForKey,
        ]),
    ) {
        let mut monitor = SessionMonitor::new();
        monitor.spawned();
        monitor.observe_output("$");
        monitor.process_exited(Duration::from_millis(millis), behavior);

        prop_assert!(matches!(
            monitor.state(),
            SessionState::Closed | SessionState::Restarting | SessionState::WaitingForKey
        ));
    }
}

// ============================================================================
// Scenarios through the session context
// ============================================================================

/// Two fast exits under the restart policy end waiting for a key, not in
/// a third immediate respawn.
#[test]
fn fast_exits_do_not_loop() {
    let (mut ctx, conn) = context(DisconnectBehavior::Restart);
    let (_, terminal) = ctx.open_connection(conn, None).unwrap();
    ctx.observe_output(terminal, "$").unwrap();

    // The fake spawn connects instantly, so this exit is inside the
    // loop window and the guard trips on the first iteration already.
    let event = ctx.process_exited(terminal).unwrap();
    assert_eq!(event, LifecycleEvent::WaitingForKey { loop_guarded: true });
    assert_eq!(ctx.state_of(terminal), Some(SessionState::WaitingForKey));

    // Respawn by hand, then die quickly again: still no loop.
    let event = ctx.wait_key(terminal, WaitKeyInput::Enter).unwrap().unwrap();
    let LifecycleEvent::Restarted { replacement } = event else {
        panic!("expected restart");
    };
    ctx.observe_output(replacement, "$").unwrap();

    let event = ctx.process_exited(replacement).unwrap();
    assert_eq!(event, LifecycleEvent::WaitingForKey { loop_guarded: true });
}

/// The full §-style walkthrough: open, split, close one pane, close the
/// other, tab gone.
#[test]
fn scenario_open_split_close_through_context() {
    let (mut ctx, conn) = context(DisconnectBehavior::WaitForKey);
    let (tab, a) = ctx.open_connection(conn, None).unwrap();
    ctx.split(
        tab,
        Some(a),
        Orientation::Horizontal,
        SplitSource::SameConnection,
        None,
    )
    .unwrap();

    let terminals = ctx.layout().terminals_in_tab(tab).unwrap();
    assert_eq!(terminals.len(), 2);
    let b = terminals[1];

    assert_eq!(
        ctx.close_terminal(a, true).unwrap(),
        CloseRequest::Done(CloseOutcome::SiblingPromoted)
    );
    assert!(matches!(
        ctx.close_terminal(b, true).unwrap(),
        CloseRequest::Done(CloseOutcome::TabClosed { .. })
    ));
    assert_eq!(ctx.layout().tab_count(), 0);
    assert_eq!(ctx.layout().workspace_count(), 1);
}

/// A replacement terminal inherits pane and cluster but gets a fresh
/// monitor that runs prompt detection again.
#[test]
fn replacement_goes_through_prompt_detection_again() {
    let (mut ctx, conn) = context(DisconnectBehavior::WaitForKey);
    let (_, terminal) = ctx.open_connection(conn, None).unwrap();
    ctx.observe_output(terminal, "$").unwrap();
    ctx.process_exited(terminal).unwrap();

    let event = ctx.wait_key(terminal, WaitKeyInput::Enter).unwrap().unwrap();
    let LifecycleEvent::Restarted { replacement } = event else {
        panic!("expected restart");
    };

    assert_eq!(
        ctx.state_of(replacement),
        Some(SessionState::AwaitingPrompt)
    );
    ctx.observe_output(replacement, "web01 $").unwrap();
    assert_eq!(ctx.state_of(replacement), Some(SessionState::Ready));
}
