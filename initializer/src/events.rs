//! Lifecycle events of an invocation
//!
//! Each event is written as one structured log line carrying a stable event
//! type and the event's fields as JSON metadata.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

/// All lifecycle events the initializer reports.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum InitEvent {
    /// An invocation began
    InvocationStarted { request_id: String },

    /// Statement script read and split
    ScriptLoaded { path: String, statements: usize },

    /// Database session opened
    Connected { host: String, port: u16 },

    /// One statement ran and its rows were drained
    StatementExecuted {
        index: usize,
        statement: String,
        rows: usize,
    },

    /// Transaction committed
    Committed { statements: usize },

    /// Transaction rolled back after a failure
    RolledBack { reason: String },

    /// Invocation finished successfully
    InvocationCompleted {
        started_at: DateTime<Utc>,
        statements: usize,
        rows: usize,
        duration_ms: u64,
    },

    /// Invocation failed
    InvocationFailed {
        kind: String,
        error: String,
        policy: String,
    },
}

impl InitEvent {
    /// Get the event type name for logging.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::InvocationStarted { .. } => "DB_INIT_INVOCATION_STARTED",
            Self::ScriptLoaded { .. } => "DB_INIT_SCRIPT_LOADED",
            Self::Connected { .. } => "DB_INIT_CONNECTED",
            Self::StatementExecuted { .. } => "DB_INIT_STATEMENT_EXECUTED",
            Self::Committed { .. } => "DB_INIT_COMMITTED",
            Self::RolledBack { .. } => "DB_INIT_ROLLED_BACK",
            Self::InvocationCompleted { .. } => "DB_INIT_INVOCATION_COMPLETED",
            Self::InvocationFailed { .. } => "DB_INIT_INVOCATION_FAILED",
        }
    }

    /// Convert event to a human-readable message.
    pub fn message(&self) -> String {
        match self {
            Self::InvocationStarted { request_id } => {
                format!("Invocation {} started", request_id)
            }
            Self::ScriptLoaded { path, statements } => {
                format!("Loaded {} statements from {}", statements, path)
            }
            Self::Connected { host, port } => format!("Connected to {}:{}", host, port),
            Self::StatementExecuted {
                index,
                statement,
                rows,
            } => format!("Statement #{} returned {} rows: {}", index, rows, statement),
            Self::Committed { statements } => {
                format!("Committed {} statements", statements)
            }
            Self::RolledBack { reason } => format!("Rolled back: {}", reason),
            Self::InvocationCompleted {
                started_at,
                statements,
                rows,
                duration_ms,
            } => format!(
                "Invocation started at {} completed: {} statements, {} rows in {}ms",
                started_at.to_rfc3339(),
                statements,
                rows,
                duration_ms
            ),
            Self::InvocationFailed {
                kind,
                error,
                policy,
            } => format!("Invocation failed ({}, policy={}): {}", kind, policy, error),
        }
    }

    /// Write the event to the log.
    pub fn emit(&self) {
        let event_type = self.event_type();
        let message = self.message();
        let metadata = serde_json::to_string(self).unwrap_or_default();

        match self {
            Self::InvocationFailed { .. } => error!(event = %event_type, %metadata, "{}", message),
            Self::RolledBack { .. } => warn!(event = %event_type, %metadata, "{}", message),
            _ => info!(event = %event_type, %metadata, "{}", message),
        }
    }
}
