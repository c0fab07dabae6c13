//! Per-invocation handler
//!
//! `run` is the linear path (read script, connect, execute all, commit,
//! close) and returns its outcome explicitly. `handle` is the boundary facing the
//! Lambda runtime: it logs the outcome and applies the failure policy.

use crate::config::{FailurePolicy, InitializerConfig};
use crate::credentials::Credentials;
use crate::database::{Connector, Session};
use crate::error::InitError;
use crate::events::InitEvent;
use crate::script::load_script;
use chrono::{DateTime, Utc};
use lambda_runtime::LambdaEvent;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Outcome of one successful run
#[derive(Debug, Clone)]
pub struct InvocationReport {
    pub started_at: DateTime<Utc>,
    pub statements: usize,
    pub rows: usize,
    pub duration_ms: u64,
}

/// Runs the statement script against the database, once per invocation.
///
/// Built once at startup and shared by every invocation of the process.
pub struct Initializer {
    config: InitializerConfig,
    credentials: Credentials,
    connector: Box<dyn Connector>,
}

impl Initializer {
    pub fn new(
        config: InitializerConfig,
        credentials: Credentials,
        connector: impl Connector + 'static,
    ) -> Self {
        Self {
            config,
            credentials,
            connector: Box::new(connector),
        }
    }

    /// Handle one Lambda event.
    ///
    /// With [`FailurePolicy::Swallow`] this never returns an error: failures
    /// are only visible in the logs. With [`FailurePolicy::Propagate`] the
    /// failure is returned so the runtime reports the invocation as failed.
    #[instrument(skip_all, fields(request_id = %event.context.request_id))]
    pub async fn handle(&self, event: LambdaEvent<Value>) -> Result<(), InitError> {
        info!(event = %event.payload, "Received invocation event");

        InitEvent::InvocationStarted {
            request_id: event.context.request_id.clone(),
        }
        .emit();

        match self.run().await {
            Ok(report) => {
                InitEvent::InvocationCompleted {
                    started_at: report.started_at,
                    statements: report.statements,
                    rows: report.rows,
                    duration_ms: report.duration_ms,
                }
                .emit();
                Ok(())
            }
            Err(e) => {
                InitEvent::InvocationFailed {
                    kind: e.kind().to_string(),
                    error: e.to_string(),
                    policy: self.config.failure_policy.to_string(),
                }
                .emit();

                match self.config.failure_policy {
                    FailurePolicy::Swallow => Ok(()),
                    FailurePolicy::Propagate => Err(e),
                }
            }
        }
    }

    /// Read the script, connect, execute every statement in order and commit.
    ///
    /// Any failure after connecting rolls the transaction back before the
    /// error is returned. The connection is closed either way; a failure to
    /// close is only logged, since the transaction has already ended.
    pub async fn run(&self) -> Result<InvocationReport, InitError> {
        let started_at = Utc::now();
        let start = Instant::now();

        let statements = load_script(&self.config.script_path, self.config.split_mode).await?;
        InitEvent::ScriptLoaded {
            path: self.config.script_path.display().to_string(),
            statements: statements.len(),
        }
        .emit();

        let mut session = self.connector.connect(&self.credentials).await?;
        InitEvent::Connected {
            host: self.credentials.host.clone(),
            port: self.credentials.port,
        }
        .emit();

        let max_rows = self.config.max_logged_rows;
        let outcome = match execute_all(session.as_mut(), &statements, max_rows).await {
            Ok(rows) => session
                .commit()
                .await
                .map(|()| rows)
                .map_err(InitError::Commit),
            Err(e) => {
                roll_back(session.as_mut(), &e).await;
                Err(e)
            }
        };
        close(session).await;

        let rows = outcome?;
        InitEvent::Committed {
            statements: statements.len(),
        }
        .emit();

        Ok(InvocationReport {
            started_at,
            statements: statements.len(),
            rows,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Execute statements strictly in order, stopping at the first failure.
///
/// Returns the total number of rows the statements produced.
async fn execute_all(
    session: &mut dyn Session,
    statements: &[String],
    max_logged_rows: usize,
) -> Result<usize, InitError> {
    let mut total_rows = 0;

    for (i, sql) in statements.iter().enumerate() {
        let index = i + 1;
        info!(index, statement = %sql, "Executing statement");

        let outcome = session
            .execute(sql)
            .await
            .map_err(|source| InitError::Statement {
                index,
                statement: sql.clone(),
                source,
            })?;

        InitEvent::StatementExecuted {
            index,
            statement: sql.clone(),
            rows: outcome.row_count(),
        }
        .emit();

        let shown = &outcome.rows[..outcome.row_count().min(max_logged_rows)];
        if !shown.is_empty() {
            info!(index, result = ?shown, "Statement result");
        }
        total_rows += outcome.row_count();
    }

    Ok(total_rows)
}

async fn roll_back(session: &mut dyn Session, cause: &InitError) {
    match session.rollback().await {
        Ok(()) => InitEvent::RolledBack {
            reason: cause.to_string(),
        }
        .emit(),
        // The server discards the open transaction when the connection drops.
        Err(e) => warn!(error = %e, "Rollback failed"),
    }
}

async fn close(session: Box<dyn Session>) {
    match session.close().await {
        Ok(()) => debug!("Database session closed"),
        Err(e) => warn!(error = %e, "Failed to close database session"),
    }
}
