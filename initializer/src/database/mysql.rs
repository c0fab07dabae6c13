//! MySQL sessions over sqlx
//!
//! Statements are sent without bind arguments, so sqlx uses the text protocol
//! (COM_QUERY), which accepts DDL and account management statements the
//! prepared-statement protocol rejects.

use super::{Connector, Session, StatementOutcome};
use crate::credentials::Credentials;
use crate::error::InitError;
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{ConnectOptions, Connection, Executor, Row};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Opens a single MySQL connection per invocation
pub struct MySqlConnector {
    connect_timeout: Duration,
    select_database: bool,
}

impl MySqlConnector {
    pub fn new(connect_timeout: Duration, select_database: bool) -> Self {
        Self {
            connect_timeout,
            select_database,
        }
    }

    /// Connection options for the credential bundle.
    ///
    /// sqlx statement logging is off; the handler logs every statement itself.
    pub fn connect_options(&self, credentials: &Credentials) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&credentials.host)
            .port(credentials.port)
            .username(&credentials.username)
            .password(&credentials.password)
            .disable_statement_logging();

        if self.select_database {
            options.database(&credentials.dbname)
        } else {
            options
        }
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    async fn connect(&self, credentials: &Credentials) -> Result<Box<dyn Session>, InitError> {
        let options = self.connect_options(credentials);
        let connect_error = |source| InitError::Connect {
            host: credentials.host.clone(),
            port: credentials.port,
            source,
        };

        let attempt = MySqlConnection::connect_with(&options);
        let mut conn = match timeout(self.connect_timeout, attempt).await {
            Ok(result) => result.map_err(connect_error)?,
            Err(_) => {
                return Err(InitError::ConnectTimeout {
                    host: credentials.host.clone(),
                    port: credentials.port,
                    timeout: self.connect_timeout,
                })
            }
        };

        // All statements of the invocation share one transaction.
        conn.execute("SET autocommit = 0").await.map_err(connect_error)?;

        debug!(host = %credentials.host, port = credentials.port, "MySQL session opened");
        Ok(Box::new(MySqlSession { conn }))
    }
}

/// One MySQL connection with autocommit disabled
pub struct MySqlSession {
    conn: MySqlConnection,
}

#[async_trait]
impl Session for MySqlSession {
    async fn execute(&mut self, sql: &str) -> Result<StatementOutcome, sqlx::Error> {
        let rows = self.conn.fetch_all(sql).await?;
        Ok(StatementOutcome {
            rows: rows.iter().map(render_row).collect(),
        })
    }

    async fn commit(&mut self) -> Result<(), sqlx::Error> {
        self.conn.execute("COMMIT").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), sqlx::Error> {
        self.conn.execute("ROLLBACK").await?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), sqlx::Error> {
        let MySqlSession { conn } = *self;
        conn.close().await
    }
}

/// Render a row as `(v1, v2, NULL)`.
///
/// Text-protocol values arrive as their textual form, so every column decodes
/// as a string; values that are not UTF-8 show as `<binary>`.
fn render_row(row: &MySqlRow) -> String {
    let values: Vec<String> = (0..row.len())
        .map(|i| match row.try_get_unchecked::<Option<String>, _>(i) {
            Ok(Some(value)) => value,
            Ok(None) => "NULL".to_string(),
            Err(_) => "<binary>".to_string(),
        })
        .collect();
    format!("({})", values.join(", "))
}
