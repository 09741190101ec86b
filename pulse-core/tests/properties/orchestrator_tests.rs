//! Property-based tests for the orchestrator line protocol
//!
//! Validates classification of script output lines and the reply
//! framing of the request/response actions.

use proptest::prelude::*;
use pulse_core::{
    HistoryEntry, LineDisposition, OrchestratorAction, OrchestratorHost, TerminalId,
    classify_line, handle_line,
};

#[derive(Default)]
struct NullHost {
    entries: Vec<HistoryEntry>,
    displayed: usize,
}

impl OrchestratorHost for NullHost {
    fn feed_child(&mut self, _terminal: TerminalId, _bytes: &[u8]) {}

    fn feed_display(&mut self, _terminal: TerminalId, _bytes: &[u8]) {
        self.displayed += 1;
    }

    fn last_line(&mut self, _terminal: TerminalId) -> String {
        "web01 $".to_string()
    }

    fn substitute(&mut self, _terminal: TerminalId, template: &str) -> String {
        template.to_string()
    }

    fn record(&mut self, _terminal: TerminalId, entry: HistoryEntry) {
        self.entries.push(entry);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Lines that do not open a JSON object are always diagnostics,
    /// never parsed and never logged as failures.
    #[test]
    fn non_json_is_always_diagnostic(line in "[a-zA-Z0-9 .:!-]{0,60}") {
        prop_assume!(!line.trim_start().starts_with('{'));
        prop_assert_eq!(
            classify_line(&line),
            LineDisposition::Diagnostic(line.clone())
        );

        let mut host = NullHost::default();
        handle_line(&mut host, TerminalId::new(), &line);
        prop_assert!(host.entries.is_empty());
        prop_assert_eq!(host.displayed, 1);
    }

    /// Any payload survives the encode/classify trip for `feed-child`.
    #[test]
    fn feed_child_payload_round_trips(data in "[^\\p{Cc}]{0,40}") {
        let line = serde_json::json!({"action": "feed-child", "data": data}).to_string();
        prop_assert_eq!(
            classify_line(&line),
            LineDisposition::Action(OrchestratorAction::FeedChild(data.clone()))
        );
    }

    /// A JSON object without an `action` field is malformed: it is
    /// logged as a failed command with empty output, not displayed.
    #[test]
    fn json_without_action_is_malformed(key in "[a-z]{1,10}", value in "[a-z]{0,10}") {
        prop_assume!(key != "action");
        let line = format!(r#"{{"{key}": "{value}"}}"#);
        prop_assert_eq!(classify_line(&line), LineDisposition::Malformed(line.clone()));

        let mut host = NullHost::default();
        handle_line(&mut host, TerminalId::new(), &line);
        prop_assert_eq!(host.entries.len(), 1);
        prop_assert!(!host.entries[0].success);
        prop_assert!(host.entries[0].output.is_empty());
        prop_assert_eq!(host.displayed, 0);
    }

    /// Request/response actions always reply with exactly one
    /// newline-terminated line.
    #[test]
    fn replies_are_newline_terminated(template in "[a-zA-Z {}]{0,30}") {
        let mut host = NullHost::default();
        let line = serde_json::json!({"action": "get-variable", "data": template}).to_string();
        let reply = handle_line(&mut host, TerminalId::new(), &line).unwrap();
        prop_assert!(reply.ends_with('\n'));
        prop_assert_eq!(reply.matches('\n').count(), 1);

        let reply = handle_line(
            &mut host,
            TerminalId::new(),
            r#"{"action": "get-last-line"}"#,
        )
        .unwrap();
        prop_assert_eq!(reply, "web01 $\n");
    }

    /// Unknown actions are displayed verbatim as diagnostics and leave
    /// no history entry.
    #[test]
    fn unknown_actions_are_displayed(action in "[a-z]{2,12}") {
        prop_assume!(!matches!(
            action.as_str(),
            "feed-child" | "feed" | "get-last-line" | "get-variable"
        ));
        let line = serde_json::json!({"action": action}).to_string();

        let mut host = NullHost::default();
        let reply = handle_line(&mut host, TerminalId::new(), &line);
        prop_assert_eq!(reply, None);
        prop_assert!(host.entries.is_empty());
        prop_assert_eq!(host.displayed, 1);
    }
}
