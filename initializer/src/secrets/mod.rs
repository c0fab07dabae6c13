//! Secret retrieval
//!
//! This module provides the sources the credentials secret can be read from:
//! - Secrets Manager through the AWS SDK
//! - The Parameters and Secrets Lambda Extension over local HTTP

mod extension;
mod sdk;

use crate::config::SecretSourceKind;
use crate::error::InitError;
use async_trait::async_trait;

pub use extension::{SecretsExtension, TOKEN_HEADER};
pub use sdk::SecretsManager;

/// A store that returns the string value of a named secret.
#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn get_secret(&self, secret_id: &str) -> Result<String, InitError>;
}

/// Build the secret source selected by configuration.
pub async fn secret_source(kind: SecretSourceKind) -> Box<dyn SecretSource> {
    match kind {
        SecretSourceKind::Sdk => Box::new(SecretsManager::from_env().await),
        SecretSourceKind::Extension => Box::new(SecretsExtension::from_env()),
    }
}
