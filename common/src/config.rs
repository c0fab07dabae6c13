//! Environment variable parsing helpers
//!
//! Provides ergonomic helpers for reading configuration from environment variables,
//! plus accessors for the variables the Lambda platform sets for every function.

use anyhow::{anyhow, Context, Result};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Extension trait for parsing environment variables.
///
/// Provides convenient methods for reading env vars with defaults, required values,
/// and type parsing.
pub trait ConfigExt {
    /// Get an environment variable with a default value.
    ///
    /// # Example
    /// ```ignore
    /// let path = String::env_or("INITIALIZER_SCRIPT_PATH", "script.sql");
    /// ```
    fn env_or(name: &str, default: &str) -> String {
        env::var(name).unwrap_or_else(|_| default.to_string())
    }

    /// Get a required, non-empty environment variable.
    ///
    /// # Example
    /// ```ignore
    /// let secret = String::env_required("DB_CONFIG_SECRET")?;
    /// ```
    fn env_required(name: &str) -> Result<String> {
        let value = env::var(name).context(format!("{} must be set", name))?;
        if value.trim().is_empty() {
            return Err(anyhow!("{} must not be empty", name));
        }
        Ok(value)
    }

    /// Get an environment variable parsed as a specific type.
    ///
    /// Returns `default` if the variable is not set or fails to parse.
    fn env_parse<T: FromStr>(name: &str, default: T) -> T {
        env::var(name)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Get an environment variable parsed as a specific type, rejecting bad values.
    ///
    /// Returns `default` only when the variable is unset. A value that is set
    /// but does not parse is an error naming the variable.
    ///
    /// # Example
    /// ```ignore
    /// let timeout: u64 = u64::env_parse_checked("DB_CONNECT_TIMEOUT_SECS", 10)?;
    /// ```
    fn env_parse_checked<T>(name: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match env::var(name) {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|e| anyhow!("{} has invalid value {:?}: {}", name, raw, e)),
            Err(_) => Ok(default),
        }
    }
}

// Blanket implementation for all types
impl<T> ConfigExt for T {}

/// Default port of the AWS Parameters and Secrets Lambda Extension.
pub const SECRETS_EXTENSION_DEFAULT_PORT: u16 = 2773;

/// Lambda-specific environment helpers.
///
/// Provides easy access to the variables the Lambda runtime injects.
pub struct LambdaEnv;

impl LambdaEnv {
    /// Check if running inside a Lambda execution environment.
    pub fn is_lambda() -> bool {
        env::var("AWS_LAMBDA_FUNCTION_NAME").is_ok()
    }

    /// Get the function name.
    pub fn function_name() -> String {
        String::env_or("AWS_LAMBDA_FUNCTION_NAME", "local")
    }

    /// Get the function version.
    pub fn function_version() -> String {
        String::env_or("AWS_LAMBDA_FUNCTION_VERSION", "$LATEST")
    }

    /// Get the deployment package root, if any.
    pub fn task_root() -> Option<String> {
        env::var("LAMBDA_TASK_ROOT").ok().filter(|v| !v.is_empty())
    }

    /// Get the session token of the function's execution role.
    pub fn session_token() -> Option<String> {
        env::var("AWS_SESSION_TOKEN").ok().filter(|v| !v.is_empty())
    }

    /// Get the local port of the Parameters and Secrets extension.
    pub fn secrets_extension_port() -> u16 {
        u16::env_parse(
            "PARAMETERS_SECRETS_EXTENSION_HTTP_PORT",
            SECRETS_EXTENSION_DEFAULT_PORT,
        )
    }
}
