//! Auxiliary orchestrator protocol
//!
//! A connection may name a companion script that drives the session
//! after connect. The script speaks a newline-delimited JSON protocol
//! over its standard streams: each stdout line is one object
//! `{"action": <name>, "data": <string>}`, replies go to its stdin.
//!
//! | action          | effect                                  | reply  |
//! |-----------------|------------------------------------------|--------|
//! | `feed-child`    | `data` + `\n` to the terminal's input    | none   |
//! | `feed`          | `data` to the terminal's display         | none   |
//! | `get-last-line` |                                          | last visible output line |
//! | `get-variable`  | substitutes connection variables         | substituted string |
//!
//! Non-JSON lines and unknown actions are shown as diagnostics;
//! malformed JSON is logged to the history as a failed command. A
//! misbehaving script can never touch layout or cluster state.

use std::fmt;
use std::process::Stdio;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{SessionError, SessionResult};
use crate::models::HistoryEntry;
use crate::terminal::TerminalId;

/// Unique identifier for a running orchestrator process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrchestratorId(pub Uuid);

impl OrchestratorId {
    /// Creates a new random orchestrator ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrchestratorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrchestratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Orchestrator({})", self.0)
    }
}

/// A recognized protocol action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorAction {
    /// Write the payload plus a newline to the terminal's input.
    FeedChild(String),
    /// Write the payload to the terminal's display output.
    Feed(String),
    /// Reply with the last visible output line.
    GetLastLine,
    /// Reply with the payload after variable substitution.
    GetVariable(String),
}

/// How one stdout line from the script is treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineDisposition {
    /// A recognized protocol action.
    Action(OrchestratorAction),
    /// Shown on the terminal display, not parsed.
    Diagnostic(String),
    /// Looked like JSON but was not parseable; logged as a failed
    /// command with empty output.
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    action: String,
    #[serde(default)]
    data: String,
}

/// Classifies one line of script output.
#[must_use]
pub fn classify_line(line: &str) -> LineDisposition {
    let trimmed = line.trim();
    if !trimmed.starts_with('{') {
        return LineDisposition::Diagnostic(line.to_string());
    }
    match serde_json::from_str::<WireMessage>(trimmed) {
        Err(_) => LineDisposition::Malformed(line.to_string()),
        Ok(msg) => match msg.action.as_str() {
            "feed-child" => LineDisposition::Action(OrchestratorAction::FeedChild(msg.data)),
            "feed" => LineDisposition::Action(OrchestratorAction::Feed(msg.data)),
            "get-last-line" => LineDisposition::Action(OrchestratorAction::GetLastLine),
            "get-variable" => LineDisposition::Action(OrchestratorAction::GetVariable(msg.data)),
            _ => LineDisposition::Diagnostic(line.to_string()),
        },
    }
}

/// Terminal-side services an orchestrator line needs.
///
/// Implemented over the session context by the embedding layer; every
/// method resolves through the terminal the script was started for.
pub trait OrchestratorHost {
    /// Writes bytes to the terminal's input stream.
    fn feed_child(&mut self, terminal: TerminalId, bytes: &[u8]);

    /// Writes bytes to the terminal's display output.
    fn feed_display(&mut self, terminal: TerminalId, bytes: &[u8]);

    /// Last visible line of the terminal's output.
    fn last_line(&mut self, terminal: TerminalId) -> String;

    /// Substitutes connection variables into a template.
    fn substitute(&mut self, terminal: TerminalId, template: &str) -> String;

    /// Records a history entry for the terminal's connection.
    fn record(&mut self, terminal: TerminalId, entry: HistoryEntry);
}

/// Applies one stdout line. Returns the reply to write to the script's
/// stdin, if the action has one.
pub fn handle_line<H: OrchestratorHost + ?Sized>(
    host: &mut H,
    terminal: TerminalId,
    line: &str,
) -> Option<String> {
    match classify_line(line) {
        LineDisposition::Action(OrchestratorAction::FeedChild(data)) => {
            host.feed_child(terminal, format!("{data}\n").as_bytes());
            host.record(terminal, HistoryEntry::success(line, ""));
            None
        }
        LineDisposition::Action(OrchestratorAction::Feed(data)) => {
            host.feed_display(terminal, format!("{data}\r\n").as_bytes());
            host.record(terminal, HistoryEntry::success(line, ""));
            None
        }
        LineDisposition::Action(OrchestratorAction::GetLastLine) => {
            let last = host.last_line(terminal);
            host.record(terminal, HistoryEntry::success(line, last.clone()));
            Some(format!("{last}\n"))
        }
        LineDisposition::Action(OrchestratorAction::GetVariable(data)) => {
            let value = host.substitute(terminal, &data);
            host.record(terminal, HistoryEntry::success(line, value.clone()));
            Some(format!("{value}\n"))
        }
        LineDisposition::Diagnostic(text) => {
            debug!(terminal = %terminal, "orchestrator diagnostic: {text}");
            host.feed_display(terminal, format!("{text}\r\n").as_bytes());
            None
        }
        LineDisposition::Malformed(text) => {
            warn!(terminal = %terminal, "malformed orchestrator line");
            host.record(terminal, HistoryEntry::failure(text));
            None
        }
    }
}

/// Spawns the orchestrator script and pumps its streams until it exits.
///
/// The script path gets connection variables substituted and `~`
/// expanded. Stdout lines go through [`handle_line`]; stderr lines are
/// shown as diagnostics. A script that cannot be started, and read
/// failures mid-pump, are logged to the history and end the pump
/// without touching any other state. The exit status is recorded too.
///
/// # Errors
///
/// Returns I/O errors from writing replies and from waiting on the
/// child.
pub async fn run<H: OrchestratorHost>(
    script_path: &str,
    terminal: TerminalId,
    host: &mut H,
) -> SessionResult<()> {
    let substituted = host.substitute(terminal, script_path);
    let expanded = shellexpand::tilde(&substituted);
    let spawned = Command::new(expanded.as_ref())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();
    let mut child = match spawned {
        Ok(child) => child,
        Err(err) => {
            warn!(terminal = %terminal, script = %expanded, "orchestrator failed to start: {err}");
            host.record(
                terminal,
                HistoryEntry::failure(format!("orchestrator spawn failed: {expanded}: {err}")),
            );
            return Ok(());
        }
    };

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| SessionError::SpawnFailed("no stdin pipe".to_string()))?;
    let mut stdout = BufReader::new(
        child
            .stdout
            .take()
            .ok_or_else(|| SessionError::SpawnFailed("no stdout pipe".to_string()))?,
    )
    .lines();
    let mut stderr = BufReader::new(
        child
            .stderr
            .take()
            .ok_or_else(|| SessionError::SpawnFailed("no stderr pipe".to_string()))?,
    )
    .lines();

    let mut stderr_done = false;
    loop {
        tokio::select! {
            line = stdout.next_line() => match line {
                Ok(None) => break,
                Ok(Some(line)) => {
                    if let Some(reply) = handle_line(host, terminal, &line) {
                        stdin.write_all(reply.as_bytes()).await?;
                        stdin.flush().await?;
                    }
                }
                Err(err) => {
                    host.record(
                        terminal,
                        HistoryEntry::failure(format!("orchestrator read failed: {err}")),
                    );
                    break;
                }
            },
            line = stderr.next_line(), if !stderr_done => match line {
                Ok(None) => stderr_done = true,
                Ok(Some(line)) => {
                    host.feed_display(terminal, format!("{line}\r\n").as_bytes());
                }
                Err(err) => {
                    host.record(
                        terminal,
                        HistoryEntry::failure(format!("orchestrator read failed: {err}")),
                    );
                    stderr_done = true;
                }
            },
        }
    }

    // Stdout EOF can land while stderr lines are still buffered in the
    // pipe; drain them before the exit entry.
    while !stderr_done {
        match stderr.next_line().await {
            Ok(Some(line)) => {
                host.feed_display(terminal, format!("{line}\r\n").as_bytes());
            }
            Ok(None) => stderr_done = true,
            Err(err) => {
                host.record(
                    terminal,
                    HistoryEntry::failure(format!("orchestrator read failed: {err}")),
                );
                stderr_done = true;
            }
        }
    }

    let status = child.wait().await?;
    debug!(terminal = %terminal, ?status, "orchestrator exited");
    let entry = if status.success() {
        HistoryEntry::success("orchestrator exited", status.to_string())
    } else {
        HistoryEntry::failure(format!("orchestrator exited: {status}"))
    };
    host.record(terminal, entry);
    Ok(())
}
