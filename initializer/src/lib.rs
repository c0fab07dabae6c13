//! Database initializer
//!
//! Lambda function that reads database credentials from a secret once at
//! startup, then on each invocation runs the bundled SQL script against the
//! database in a single transaction.
//!
//! - `config`: typed configuration from environment variables
//! - `credentials`: the credential bundle and how it is loaded
//! - `secrets`: secret stores the bundle is read from
//! - `script`: statement script loading and splitting
//! - `database`: driver seam and the MySQL implementation
//! - `handler`: the per-invocation run and its failure policy

pub mod config;
pub mod credentials;
pub mod database;
pub mod error;
pub mod events;
pub mod handler;
pub mod script;
pub mod secrets;

pub use config::{FailurePolicy, InitializerConfig, SecretSourceKind, SplitMode, DB_CONFIG_SECRET};
pub use credentials::{load_credentials, Credentials};
pub use database::{Connector, MySqlConnector, Session, StatementOutcome};
pub use error::{ErrorKind, InitError};
pub use handler::{Initializer, InvocationReport};
pub use script::{load_script, split_lines, split_statements};
pub use secrets::{secret_source, SecretSource, SecretsExtension, SecretsManager};
