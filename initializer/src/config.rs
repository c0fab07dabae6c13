//! Initializer configuration from environment variables

use crate::error::InitError;
use common::{ConfigExt, LambdaEnv};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Name of the variable holding the credentials secret id
pub const DB_CONFIG_SECRET: &str = "DB_CONFIG_SECRET";

/// Script bundled next to the function binary
pub const DEFAULT_SCRIPT: &str = "script.sql";

/// How the statement script is cut into statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitMode {
    /// Semicolon-delimited, quote and comment aware. Statements may span lines.
    #[default]
    Statements,
    /// One statement per non-blank line.
    Lines,
}

impl FromStr for SplitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "statements" | "semicolon" => Ok(Self::Statements),
            "lines" | "line" => Ok(Self::Lines),
            other => Err(format!("expected 'statements' or 'lines', got '{}'", other)),
        }
    }
}

/// What `handle` reports to the Lambda runtime when a run fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the failure and report success to the caller.
    #[default]
    Swallow,
    /// Log the failure and return it, failing the invocation.
    Propagate,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "swallow" => Ok(Self::Swallow),
            "propagate" => Ok(Self::Propagate),
            other => Err(format!("expected 'swallow' or 'propagate', got '{}'", other)),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Swallow => f.write_str("swallow"),
            Self::Propagate => f.write_str("propagate"),
        }
    }
}

/// Where the credentials secret is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecretSourceKind {
    /// Secrets Manager API through the AWS SDK.
    #[default]
    Sdk,
    /// Parameters and Secrets Lambda Extension on localhost.
    Extension,
}

impl FromStr for SecretSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sdk" => Ok(Self::Sdk),
            "extension" => Ok(Self::Extension),
            other => Err(format!("expected 'sdk' or 'extension', got '{}'", other)),
        }
    }
}

/// Configuration for the initializer
#[derive(Debug, Clone)]
pub struct InitializerConfig {
    pub secret_name: String,
    pub secret_source: SecretSourceKind,
    pub script_path: PathBuf,
    pub split_mode: SplitMode,
    pub failure_policy: FailurePolicy,
    pub connect_timeout: Duration,
    /// Select `dbname` as the session's default schema on connect.
    pub select_database: bool,
    /// Maximum number of result rows written to the log per statement.
    pub max_logged_rows: usize,
}

impl InitializerConfig {
    /// Configuration with defaults for everything but the secret and script.
    pub fn new(secret_name: impl Into<String>, script_path: impl Into<PathBuf>) -> Self {
        Self {
            secret_name: secret_name.into(),
            secret_source: SecretSourceKind::default(),
            script_path: script_path.into(),
            split_mode: SplitMode::default(),
            failure_policy: FailurePolicy::default(),
            connect_timeout: Duration::from_secs(10),
            select_database: false,
            max_logged_rows: 20,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, InitError> {
        Self::load().map_err(|e| InitError::configuration(format!("{:#}", e)))
    }

    fn load() -> anyhow::Result<Self> {
        let secret_name = String::env_required(DB_CONFIG_SECRET)?;
        let script = String::env_or("INITIALIZER_SCRIPT_PATH", DEFAULT_SCRIPT);

        Ok(Self {
            secret_name,
            secret_source: SecretSourceKind::env_parse_checked(
                "DB_SECRET_SOURCE",
                SecretSourceKind::Sdk,
            )?,
            script_path: resolve_script_path(&script, LambdaEnv::task_root().as_deref()),
            split_mode: SplitMode::env_parse_checked(
                "INITIALIZER_SPLIT_MODE",
                SplitMode::Statements,
            )?,
            failure_policy: FailurePolicy::env_parse_checked(
                "INITIALIZER_FAILURE_POLICY",
                FailurePolicy::Swallow,
            )?,
            connect_timeout: Duration::from_secs(u64::env_parse_checked(
                "DB_CONNECT_TIMEOUT_SECS",
                10,
            )?),
            select_database: bool::env_parse_checked("DB_SELECT_DATABASE", false)?,
            max_logged_rows: usize::env_parse_checked("INITIALIZER_LOG_ROWS", 20)?,
        })
    }
}

/// Resolve a relative script path against the deployment package root.
pub fn resolve_script_path(path: &str, task_root: Option<&str>) -> PathBuf {
    let path = Path::new(path);
    match task_root {
        Some(root) if path.is_relative() => Path::new(root).join(path),
        _ => path.to_path_buf(),
    }
}
