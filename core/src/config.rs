use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, Result};
use crate::naming::{Prefix, Service, ServiceLayout};

pub const CONFIG_ENV_VAR: &str = "SLS_CONFIG";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlsConfig {
    pub service: ServiceConfig,
    #[serde(default)]
    pub pstore: PstoreConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    pub name: String,
    pub env: String,
    pub prefix: Prefix,
    pub layout: ServiceLayout,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PstoreConfig {
    #[serde(default)]
    pub encrypted: bool,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub profile: Option<String>,
    pub operation_timeout_ms: Option<u64>,
}

/// Loads from `config_path` when given, otherwise from `SLS_CONFIG`.
pub fn load_config(config_path: Option<&str>) -> Result<SlsConfig> {
    match config_path {
        Some(path) => SlsConfig::from_file(path),
        None => SlsConfig::from_env(),
    }
}

impl SlsConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            origin: path.to_string(),
            error: Box::new(e),
        })?;
        let config: SlsConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_str = lookup(CONFIG_ENV_VAR).ok_or_else(|| ConfigError::MissingField {
            field: CONFIG_ENV_VAR.to_string(),
        })?;
        let config: SlsConfig = serde_yaml::from_str(&config_str)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.service.name.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "Service name cannot be empty".to_string(),
            }
            .into());
        }
        if self.service.env.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "Service env cannot be empty".to_string(),
            }
            .into());
        }
        if self.service.prefix.as_str().is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "Service prefix cannot be empty".to_string(),
            }
            .into());
        }
        if self.service.layout.root.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "Layout root cannot be empty".to_string(),
            }
            .into());
        }
        self.pstore.validate()
    }
}

impl ServiceConfig {
    pub fn into_service(self) -> Service {
        Service::new(self.name, self.env, self.layout)
    }
}

impl PstoreConfig {
    /// Reads `PSTORE_ENCRYPTED`, `PSTORE_REGION`, `PSTORE_ENDPOINT_URL`,
    /// `PSTORE_PROFILE` and `PSTORE_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let encrypted = match non_empty("PSTORE_ENCRYPTED") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                message: format!("PSTORE_ENCRYPTED must be a boolean, got '{}'", raw),
            })?,
            None => false,
        };

        let operation_timeout_ms = match non_empty("PSTORE_TIMEOUT_MS") {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                message: format!("PSTORE_TIMEOUT_MS must be a number, got '{}'", raw),
            })?),
            None => None,
        };

        let config = Self {
            encrypted,
            region: non_empty("PSTORE_REGION"),
            endpoint_url: non_empty("PSTORE_ENDPOINT_URL"),
            profile: non_empty("PSTORE_PROFILE"),
            operation_timeout_ms,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.operation_timeout_ms == Some(0) {
            return Err(ConfigError::ValidationFailed {
                reason: "Operation timeout must be greater than zero".to_string(),
            }
            .into());
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            if !endpoint_url.starts_with("http://") && !endpoint_url.starts_with("https://") {
                return Err(ConfigError::ValidationFailed {
                    reason: format!("Endpoint url must be http(s), got '{}'", endpoint_url),
                }
                .into());
            }
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
