//! Command-builder seam to the external invocation layer.
//!
//! Building the actual SSH/SFTP/FTP command line (flag merging, jump
//! hosts, port forwards) happens outside this crate. The engine receives
//! an opaque [`SpawnCommand`] and hands its string to the terminal
//! widget's spawn primitive.

use crate::config::AppSettings;
use crate::error::SessionResult;
use crate::models::Connection;

/// A ready-to-execute shell invocation for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnCommand {
    /// The full command line, treated as opaque.
    pub command: String,
    /// Local proxy port the builder allocated for this session, if any.
    pub proxy_port: Option<u16>,
}

impl SpawnCommand {
    /// Wraps a plain command line with no proxy port.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            proxy_port: None,
        }
    }
}

/// Builds shell invocations for connections.
///
/// Implemented by the embedding layer; the engine only forwards the
/// result to the terminal factory.
pub trait CommandBuilder {
    /// Produces the invocation for a connection under the given
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection cannot be turned into a
    /// runnable command (missing host, unresolvable key file).
    fn build(&mut self, settings: &AppSettings, connection: &Connection)
    -> SessionResult<SpawnCommand>;
}
