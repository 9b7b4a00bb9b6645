use std::env;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use sls_core::config::{CONFIG_ENV_VAR, PstoreConfig, load_config};
use sls_core::naming::{Lambda, LambdaTrigger, Prefix, ServiceLayout};
use sls_core::pstore::{Client, ParameterApi, SsmApi};
use sls_core::telemetry::init_tracing_with;
use tracing::debug;

/// pstore - manage service configuration in AWS Parameter Store
#[derive(Parser)]
#[command(name = "pstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct StoreOptions {
    /// YAML config file; its `pstore` section is used as the base settings
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Decrypt SecureString values on read
    #[arg(short, long, global = true)]
    encrypted: bool,

    /// AWS region, overrides the config file
    #[arg(long, global = true)]
    region: Option<String>,

    /// Custom endpoint, e.g. a local emulator
    #[arg(long, global = true)]
    endpoint_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Param(ParamCommand),

    /// Print the deployable name and code directory of a function
    Name(NameArgs),
}

#[derive(Subcommand, Debug)]
enum ParamCommand {
    /// Print a single parameter
    Get { key: String },

    /// Print every parameter under a path
    Path {
        path: String,

        /// Only the direct children of the path
        #[arg(long)]
        flat: bool,
    },

    /// Print several parameters and the keys that do not exist
    Collect {
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Delete a parameter and print its old value
    Delete { key: String },

    /// Create or update a parameter; prints the previous value
    Put {
        key: String,
        value: String,

        /// Replace an existing value
        #[arg(short, long)]
        overwrite: bool,
    },
}

#[derive(Args, Debug)]
struct NameArgs {
    #[arg(long)]
    prefix: String,
    #[arg(long)]
    service: String,
    #[arg(long)]
    trigger: LambdaTrigger,
    #[arg(long)]
    base_name: String,
    /// Service root used to resolve the code directory
    #[arg(long, default_value = ".")]
    root: String,
}

impl NameArgs {
    fn describe(&self) -> Value {
        let lambda = Lambda::new(
            Prefix::new(self.prefix.as_str()),
            self.service.as_str(),
            self.trigger,
            self.base_name.as_str(),
        );
        let layout = ServiceLayout::new(self.root.as_str());
        json!({
            "name": lambda.qualified_name(),
            "trigger": lambda.trigger,
            "code_dir": layout.code_dir(&lambda),
            "build_dir": layout.build_dir(),
        })
    }
}

async fn execute<A: ParameterApi>(client: &Client<A>, command: ParamCommand) -> Result<Value> {
    debug!("Executing {:?}", command);
    let output = match command {
        ParamCommand::Get { key } => {
            let value = client.get(&key).await?;
            json!({ key: value })
        }
        ParamCommand::Path { path, flat } => json!(client.get_by_path(&path, !flat).await?),
        ParamCommand::Collect { keys } => json!(client.get_many(&keys).await?),
        ParamCommand::Delete { key } => json!({ "previous": client.delete(&key).await? }),
        ParamCommand::Put {
            key,
            value,
            overwrite,
        } => json!({ "previous": client.put(&key, &value, overwrite).await? }),
    };
    Ok(output)
}

/// Base settings come from `--config` or `SLS_CONFIG`, else from `PSTORE_*`.
/// Command line flags win.
fn resolve_config(options: &StoreOptions) -> Result<PstoreConfig> {
    let mut config = if options.config.is_some() || env::var_os(CONFIG_ENV_VAR).is_some() {
        load_config(options.config.as_deref())
            .context("Failed to load configuration")?
            .pstore
    } else {
        PstoreConfig::from_env()?
    };

    config.encrypted |= options.encrypted;
    if options.region.is_some() {
        config.region = options.region.clone();
    }
    if options.endpoint_url.is_some() {
        config.endpoint_url = options.endpoint_url.clone();
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing_with("sls_core=warn,pstore=warn");

    let cli = Cli::parse();
    let output = match cli.command {
        Commands::Name(args) => args.describe(),
        Commands::Param(command) => {
            let config = resolve_config(&cli.store)?;
            let client = Client::new(SsmApi::from_config(&config).await, config.encrypted);
            execute(&client, command).await?
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sls_core::pstore::MemoryParameterStore;
    use std::io::Write;

    fn create_test_client() -> Client<MemoryParameterStore> {
        Client::new(
            MemoryParameterStore::new().with_parameters([("/app/db", "host"), ("/app/x/y", "z")]),
            false,
        )
    }

    #[test]
    fn test_cli_parses_put() {
        let cli = Cli::try_parse_from(["pstore", "--encrypted", "put", "/a", "1", "--overwrite"])
            .unwrap();
        assert!(cli.store.encrypted);
        assert!(matches!(
            cli.command,
            Commands::Param(ParamCommand::Put { ref key, ref value, overwrite: true })
                if key == "/a" && value == "1"
        ));
    }

    #[test]
    fn test_cli_rejects_unknown_trigger() {
        let result = Cli::try_parse_from([
            "pstore",
            "name",
            "--prefix",
            "acme",
            "--service",
            "svc",
            "--trigger",
            "kinesis",
            "--base-name",
            "fn",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_describe_lambda() {
        let cli = Cli::try_parse_from([
            "pstore",
            "name",
            "--prefix",
            "acme-dev",
            "--service",
            "billing",
            "--trigger",
            "SNS",
            "--base-name",
            "notify",
            "--root",
            "/srv",
        ])
        .unwrap();
        let Commands::Name(args) = cli.command else {
            panic!("expected the name command");
        };

        let described = args.describe();
        assert_eq!(described["name"], "acme-dev-billing-sns_notify");
        assert_eq!(described["trigger"], "sns");
        assert_eq!(described["code_dir"], "/srv/app/lambdas/sns/notify");
        assert_eq!(described["build_dir"], "/srv/build");
    }

    #[test]
    fn test_resolve_config_from_file_with_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"service: {name: a, env: dev, prefix: acme, layout: {root: /srv}}\n\
              pstore: {region: eu-west-1, operation_timeout_ms: 2000}\n",
        )
        .unwrap();

        let options = StoreOptions {
            config: file.path().to_str().map(String::from),
            encrypted: true,
            region: Some("us-east-1".to_string()),
            endpoint_url: None,
        };
        let config = resolve_config(&options).unwrap();
        assert!(config.encrypted);
        assert_eq!(config.region.as_deref(), Some("us-east-1"));
        assert_eq!(config.operation_timeout_ms, Some(2000));
    }

    #[test]
    fn test_resolve_config_missing_file_fails() {
        let options = StoreOptions {
            config: Some("/definitely/not/here.yaml".to_string()),
            ..Default::default()
        };
        assert!(resolve_config(&options).is_err());
    }

    #[tokio::test]
    async fn test_execute_round_trip() {
        let client = create_test_client();

        let put = execute(
            &client,
            ParamCommand::Put {
                key: "/app/new".to_string(),
                value: "v".to_string(),
                overwrite: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(put["previous"], "");

        let path = execute(
            &client,
            ParamCommand::Path {
                path: "app".to_string(),
                flat: true,
            },
        )
        .await
        .unwrap();
        assert_eq!(path, json!({ "/app/db": "host", "/app/new": "v" }));

        let deleted = execute(
            &client,
            ParamCommand::Delete {
                key: "/app/db".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(deleted["previous"], "host");
    }

    #[tokio::test]
    async fn test_execute_get_missing_fails() {
        let client = create_test_client();
        let result = execute(
            &client,
            ParamCommand::Get {
                key: "/app/missing".to_string(),
            },
        )
        .await;
        assert!(result.is_err());
    }
}
