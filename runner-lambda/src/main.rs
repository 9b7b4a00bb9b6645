use std::collections::BTreeMap;
use std::env;

use anyhow::Context;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde::{Deserialize, Serialize};
use sls_core::config::PstoreConfig;
use sls_core::pstore::{Client, ParameterApi, SsmApi};
use sls_core::telemetry::init_tracing_with;
use tracing::{error, info};

/// Exactly one of `key`, `keys` or `path` is expected.
#[derive(Debug, Default, Deserialize)]
struct LookupRequest {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub keys: Option<Vec<String>>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub recursive: Option<bool>,
}

#[derive(Debug, Serialize)]
struct LookupResponse {
    pub status: String,
    pub parameters: BTreeMap<String, String>,
    pub invalid: Vec<String>,
    pub errors: Vec<String>,
}

impl LookupResponse {
    fn success(parameters: BTreeMap<String, String>, invalid: Vec<String>) -> Self {
        Self {
            status: "success".to_string(),
            parameters,
            invalid,
            errors: vec![],
        }
    }

    fn error(message: String) -> Self {
        error!("{}", message);
        Self {
            status: "error".to_string(),
            parameters: BTreeMap::new(),
            invalid: vec![],
            errors: vec![message],
        }
    }
}

async fn lookup<A: ParameterApi>(client: &Client<A>, request: LookupRequest) -> LookupResponse {
    match (request.key, request.keys, request.path) {
        (Some(key), None, None) => match client.get(&key).await {
            Ok(value) => LookupResponse::success(BTreeMap::from([(key, value)]), vec![]),
            Err(e) if e.is_not_found() => LookupResponse::success(BTreeMap::new(), vec![key]),
            Err(e) => LookupResponse::error(format!("Lookup of {} failed: {}", key, e)),
        },
        (None, Some(keys), None) => match client.get_many(&keys).await {
            Ok(set) => LookupResponse::success(set.parameters, set.invalid),
            Err(e) => LookupResponse::error(format!("Batch lookup failed: {}", e)),
        },
        (None, None, Some(path)) => {
            let recursive = request.recursive.unwrap_or(true);
            match client.get_by_path(&path, recursive).await {
                Ok(parameters) => LookupResponse::success(parameters, vec![]),
                Err(e) => LookupResponse::error(format!("Path lookup of {} failed: {}", path, e)),
            }
        }
        _ => LookupResponse::error(
            "request must set exactly one of key, keys or path".to_string(),
        ),
    }
}

async fn lambda_handler<A: ParameterApi>(
    client: &Client<A>,
    event: LambdaEvent<LookupRequest>,
) -> Result<LookupResponse, Error> {
    Ok(lookup(client, event.payload).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing_with("sls_core=info,bootstrap=info");

    let config = PstoreConfig::from_env().map_err(|e| format!("Invalid configuration: {}", e))?;
    let client = Client::new(SsmApi::from_config(&config).await, config.encrypted);

    if env::var("AWS_LAMBDA_RUNTIME_API").is_ok() {
        info!("Running in AWS Lambda environment");
        lambda_runtime::run(service_fn(|event: LambdaEvent<LookupRequest>| {
            lambda_handler(&client, event)
        }))
        .await
    } else {
        info!("Running in local development mode");

        let raw = env::args()
            .nth(1)
            .context("expected a JSON lookup request as the first argument")?;
        let request: LookupRequest =
            serde_json::from_str(&raw).context("Failed to parse lookup request")?;

        let response = lookup(&client, request).await;
        println!("{}", serde_json::to_string_pretty(&response)?);
        Ok(())
    }
}
