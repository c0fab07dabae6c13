//! Parameters and Secrets Lambda Extension backend
//!
//! The extension caches secrets and serves them on
//! `http://localhost:{port}/secretsmanager/get?secretId=...`. Requests must
//! carry the function's session token.

use super::SecretSource;
use crate::error::InitError;
use async_trait::async_trait;
use common::LambdaEnv;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Header the extension authenticates requests with
pub const TOKEN_HEADER: &str = "X-Aws-Parameters-Secrets-Token";

/// Subset of the `GetSecretValue` response we use
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetSecretValueResponse {
    secret_string: Option<String>,
}

/// Client for the local secrets extension
pub struct SecretsExtension {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl SecretsExtension {
    pub fn new(port: u16, token: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: format!("http://localhost:{}/secretsmanager/get", port),
            token,
        }
    }

    /// Create a client for the extension port and token of this function.
    pub fn from_env() -> Self {
        Self::new(LambdaEnv::secrets_extension_port(), LambdaEnv::session_token())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SecretSource for SecretsExtension {
    async fn get_secret(&self, secret_id: &str) -> Result<String, InitError> {
        let token = self.token.as_deref().ok_or_else(|| {
            InitError::configuration("AWS_SESSION_TOKEN must be set to use the secrets extension")
        })?;

        debug!(secret = %secret_id, endpoint = %self.endpoint, "Fetching secret from extension");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("secretId", secret_id)])
            .header(TOKEN_HEADER, token)
            .send()
            .await
            .map_err(|e| {
                InitError::configuration(format!("secrets extension unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InitError::configuration(format!(
                "secrets extension returned {} for {}: {}",
                status,
                secret_id,
                body.trim()
            )));
        }

        let body: GetSecretValueResponse = response.json().await.map_err(|e| {
            InitError::configuration(format!("invalid secrets extension response: {}", e))
        })?;

        body.secret_string.ok_or_else(|| {
            InitError::configuration(format!("secret {} has no string value", secret_id))
        })
    }
}
