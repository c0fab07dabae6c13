//! Structured logging initialization
//!
//! Provides consistent logging initialization across initializer components.
//! Lambda ships stdout to CloudWatch, which stamps every line on arrival, so
//! timestamps and ANSI colors are left out of the formatted output.

use crate::config::ConfigExt;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of log lines, selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Parse a format name. Anything other than "json" is plain text.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }

    /// Read the format from `LOG_FORMAT`, defaulting to text.
    pub fn from_env() -> Self {
        Self::parse(&String::env_or("LOG_FORMAT", "text"))
    }
}

/// Guard that keeps the tracing subscriber active.
/// Drop this at the end of main to flush logs.
pub struct LogGuard;

/// Initialize structured logging for a component.
///
/// The filter comes from `RUST_LOG` and falls back to `info`.
/// Returns a guard that should be held for the lifetime of the program.
///
/// # Example
/// ```ignore
/// let _guard = init_logging("db-initializer");
/// info!("Starting up...");
/// ```
pub fn init_logging(component: &str) -> LogGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let format = LogFormat::from_env();

    let text = (format == LogFormat::Text).then(|| {
        fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .without_time()
    });
    let json = (format == LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(false)
            .without_time()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .init();

    tracing::debug!(component, ?format, "Logging initialized");

    LogGuard
}
