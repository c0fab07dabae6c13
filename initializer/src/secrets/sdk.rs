//! Secrets Manager backend using the AWS SDK

use super::SecretSource;
use crate::error::InitError;
use async_trait::async_trait;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::Client;
use tracing::debug;

/// Secrets Manager client
///
/// Region and credentials come from the standard AWS environment, which the
/// Lambda runtime populates for the function's execution role.
pub struct SecretsManager {
    client: Client,
}

impl SecretsManager {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a client from the shared AWS configuration.
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl SecretSource for SecretsManager {
    async fn get_secret(&self, secret_id: &str) -> Result<String, InitError> {
        debug!(secret = %secret_id, "Fetching secret from Secrets Manager");

        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| {
                InitError::configuration(format!(
                    "failed to fetch secret {}: {}",
                    secret_id,
                    DisplayErrorContext(&e)
                ))
            })?;

        output.secret_string().map(str::to_string).ok_or_else(|| {
            InitError::configuration(format!("secret {} has no string value", secret_id))
        })
    }
}
