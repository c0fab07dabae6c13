//! Error types for the initializer
//!
//! Every failure carries a kind that places it in one of two tiers: startup
//! errors abort the process, invocation errors end a single run.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Coarse classification of an [`InitError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Resource,
    Connection,
    StatementExecution,
    Commit,
}

impl ErrorKind {
    /// Stable name used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "ConfigurationError",
            Self::Resource => "ResourceError",
            Self::Connection => "ConnectionError",
            Self::StatementExecution => "StatementExecutionError",
            Self::Commit => "CommitError",
        }
    }

    /// Whether the error happens before any invocation is handled.
    pub fn is_startup(&self) -> bool {
        matches!(self, Self::Configuration)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to read statement script {}: {source}", path.display())]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse statement script {}: {reason}", path.display())]
    ScriptParse { path: PathBuf, reason: String },

    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: sqlx::Error,
    },

    #[error("timed out connecting to {host}:{port} after {}s", timeout.as_secs())]
    ConnectTimeout {
        host: String,
        port: u16,
        timeout: Duration,
    },

    #[error("statement #{index} failed: {source}")]
    Statement {
        index: usize,
        statement: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to commit transaction: {0}")]
    Commit(#[source] sqlx::Error),
}

impl InitError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::ScriptRead { .. } | Self::ScriptParse { .. } => ErrorKind::Resource,
            Self::Connect { .. } | Self::ConnectTimeout { .. } => ErrorKind::Connection,
            Self::Statement { .. } => ErrorKind::StatementExecution,
            Self::Commit(_) => ErrorKind::Commit,
        }
    }
}
