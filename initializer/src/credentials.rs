//! Database credentials parsed from the configuration secret
//!
//! The secret is the JSON document RDS writes for a cluster:
//! `{"host", "port", "username", "password", "dbname", ...}`.
//! Unknown keys are ignored.

use crate::error::InitError;
use crate::secrets::SecretSource;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::fmt;
use tracing::info;

/// Credential bundle used to open the database connection
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub host: String,
    #[serde(deserialize_with = "port_number_or_string")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub dbname: String,
}

impl Credentials {
    /// Parse the secret's string value.
    pub fn from_secret_string(secret: &str) -> Result<Self, InitError> {
        serde_json::from_str(secret)
            .map_err(|e| InitError::configuration(format!("malformed credentials secret: {}", e)))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .finish()
    }
}

/// RDS stores the port as a number; hand-written secrets often quote it.
fn port_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer) {
        Ok(Port::Number(port)) => Ok(port),
        Ok(Port::Text(text)) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid port '{}'", text))),
        Err(_) => Err(de::Error::custom("port must be an integer between 0 and 65535")),
    }
}

/// Fetch and parse the credentials secret.
///
/// Runs once at startup; every failure is a configuration error.
pub async fn load_credentials(
    source: &dyn SecretSource,
    secret_id: &str,
) -> Result<Credentials, InitError> {
    let secret = source.get_secret(secret_id).await?;
    let credentials = Credentials::from_secret_string(&secret)?;

    info!(
        secret = %secret_id,
        host = %credentials.host,
        port = credentials.port,
        username = %credentials.username,
        database = %credentials.dbname,
        "Loaded database credentials"
    );

    Ok(credentials)
}
