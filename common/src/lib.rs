//! Shared utilities for db-initializer components
//!
//! This crate provides the ambient functionality used by the initializer binaries:
//! - Structured logging initialization
//! - Environment variable parsing helpers
//! - Lambda platform environment accessors

pub mod config;
pub mod logging;

pub use config::{ConfigExt, LambdaEnv};
pub use logging::{init_logging, LogFormat};
