//! Lambda entry point for the database initializer
//!
//! Startup loads configuration and fetches the credentials secret once. A
//! failure there ends the process before the runtime loop starts, so no
//! invocation is ever handled with missing credentials.

use anyhow::{Context, Result};
use common::{init_logging, LambdaEnv};
use db_initializer::{
    load_credentials, secret_source, Initializer, InitializerConfig, MySqlConnector,
};
use lambda_runtime::{service_fn, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};

async fn startup() -> Result<Initializer> {
    info!(
        function = %LambdaEnv::function_name(),
        version = %LambdaEnv::function_version(),
        lambda = LambdaEnv::is_lambda(),
        "DB initializer starting"
    );

    let config = InitializerConfig::from_env().context("Failed to load configuration")?;

    let secrets = secret_source(config.secret_source).await;
    let credentials = load_credentials(secrets.as_ref(), &config.secret_name)
        .await
        .context("Failed to load database credentials")?;

    let connector = MySqlConnector::new(config.connect_timeout, config.select_database);

    info!(
        script = %config.script_path.display(),
        split_mode = ?config.split_mode,
        failure_policy = %config.failure_policy,
        "Initializer ready"
    );

    Ok(Initializer::new(config, credentials, connector))
}

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    let _guard = init_logging("db-initializer");

    let initializer = match startup().await {
        Ok(initializer) => initializer,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Startup failed");
            return Err(e.into());
        }
    };

    let initializer = &initializer;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        initializer
            .handle(event)
            .await
            .map_err(lambda_runtime::Error::from)
    }))
    .await
}
