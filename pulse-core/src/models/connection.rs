//! Connection records read from the external connection store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session type of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// Local shell, no remote host.
    #[default]
    Local,
    /// SSH remote shell
    Ssh,
    /// SFTP file transfer (SSH-based)
    Sftp,
    /// FTP file transfer
    Ftp,
    /// Mosh remote shell
    Mosh,
}

impl ConnectionKind {
    /// Returns the kind identifier as a lowercase string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Ssh => "ssh",
            Self::Sftp => "sftp",
            Self::Ftp => "ftp",
            Self::Mosh => "mosh",
        }
    }

    /// Returns true for remote session types.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        !matches!(self, Self::Local)
    }

    /// Returns the default port for this kind, if it has one.
    #[must_use]
    pub const fn default_port(&self) -> Option<u16> {
        match self {
            Self::Local => None,
            Self::Ssh | Self::Sftp | Self::Mosh => Some(22),
            Self::Ftp => Some(21),
        }
    }
}

impl std::fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "Local"),
            Self::Ssh => write!(f, "SSH"),
            Self::Sftp => write!(f, "SFTP"),
            Self::Ftp => write!(f, "FTP"),
            Self::Mosh => write!(f, "Mosh"),
        }
    }
}

/// One stored connection profile.
///
/// The engine only reads these to spawn terminals, derive tab titles,
/// and substitute variables; editing and persistence belong to the
/// external configuration store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Unique identifier for this connection.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Session type.
    pub kind: ConnectionKind,
    /// Remote host; empty for local shells.
    #[serde(default)]
    pub host: String,
    /// Remote port; `None` uses the kind's default.
    #[serde(default)]
    pub port: Option<u16>,
    /// Login user; empty uses the current user.
    #[serde(default)]
    pub user: String,
    /// Folder the connection is organized under in the store.
    #[serde(default)]
    pub folder: String,
    /// Whether the connection may participate in clusters.
    #[serde(default = "default_true")]
    pub clusterable: bool,
    /// Orchestrator script invoked after the prompt appears, if any.
    #[serde(default)]
    pub orchestrator_script: Option<String>,
}

const fn default_true() -> bool {
    true
}

impl Connection {
    /// Creates a local-shell connection.
    #[must_use]
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind: ConnectionKind::Local,
            host: String::new(),
            port: None,
            user: String::new(),
            folder: String::new(),
            clusterable: true,
            orchestrator_script: None,
        }
    }

    /// Creates an SSH connection to a host.
    #[must_use]
    pub fn ssh(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind: ConnectionKind::Ssh,
            host: host.into(),
            port: None,
            user: String::new(),
            folder: String::new(),
            clusterable: true,
            orchestrator_script: None,
        }
    }

    /// Derives a clone with a different session type and a fresh id,
    /// e.g. "open SFTP here" from an SSH connection.
    #[must_use]
    pub fn clone_as(&self, kind: ConnectionKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            ..self.clone()
        }
    }

    /// The port this connection actually uses.
    #[must_use]
    pub fn effective_port(&self) -> Option<u16> {
        self.port.or_else(|| self.kind.default_port())
    }
}
