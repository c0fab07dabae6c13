//! Database access
//!
//! The handler talks to the database through [`Connector`] and [`Session`]
//! so it does not depend on a driver. [`MySqlConnector`] is the production
//! implementation.

mod mysql;

use crate::credentials::Credentials;
use crate::error::InitError;
use async_trait::async_trait;

pub use mysql::{MySqlConnector, MySqlSession};

/// Rows returned by one statement, each rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementOutcome {
    pub rows: Vec<String>,
}

impl StatementOutcome {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Opens one session per invocation.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, credentials: &Credentials) -> Result<Box<dyn Session>, InitError>;
}

/// A live connection with an open transaction.
///
/// Statements run in order on the same transaction. `commit` and `rollback`
/// end the transaction; `close` ends the connection and consumes the session.
#[async_trait]
pub trait Session: Send {
    /// Execute one statement and drain its result rows.
    async fn execute(&mut self, sql: &str) -> Result<StatementOutcome, sqlx::Error>;

    async fn commit(&mut self) -> Result<(), sqlx::Error>;

    async fn rollback(&mut self) -> Result<(), sqlx::Error>;

    async fn close(self: Box<Self>) -> Result<(), sqlx::Error>;
}
