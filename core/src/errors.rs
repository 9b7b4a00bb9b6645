use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Parameter store error: {0}")]
    Pstore(#[from] PstoreError),

    #[error("Naming error: {0}")]
    Naming(#[from] NamingError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

/// Failures reported by a [`ParameterApi`](crate::pstore::ParameterApi) implementation.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Parameter {name} not found")]
    ParameterNotFound { name: String },

    #[error("Parameter service request failed")]
    Service {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApiError {
    pub fn service<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        ApiError::Service { source: err.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::ParameterNotFound { .. })
    }
}

#[derive(Error, Debug)]
pub enum PstoreError {
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Parameter {key} not found")]
    NotFound {
        key: String,
        #[source]
        source: ApiError,
    },

    #[error("Parameter {key} exists but overwrite is false")]
    Conflict { key: String },

    #[error("{operation} failed ({target})")]
    System {
        operation: &'static str,
        target: String,
        #[source]
        source: ApiError,
    },
}

impl PstoreError {
    /// Wraps a remote failure, keeping "parameter not found" distinct from
    /// every other failure.
    pub fn from_api(err: ApiError, operation: &'static str, target: impl Into<String>) -> Self {
        let target = target.into();
        if err.is_not_found() {
            PstoreError::NotFound {
                key: target,
                source: err,
            }
        } else {
            PstoreError::System {
                operation,
                target,
                source: err,
            }
        }
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        PstoreError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PstoreError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, PstoreError::Conflict { .. })
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, PstoreError::InvalidInput { .. })
    }

    pub fn is_system(&self) -> bool {
        matches!(self, PstoreError::System { .. })
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NamingError {
    #[error("event trigger ({value}) is not registered")]
    UnknownTrigger { value: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Failed to load configuration from {origin}: {error}")]
    LoadFailed {
        origin: String,
        #[source]
        error: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON serialization failed: {reason}")]
    Json { reason: String },

    #[error("YAML serialization failed: {reason}")]
    Yaml { reason: String },
}

pub type Result<T> = std::result::Result<T, SlsError>;

impl From<serde_json::Error> for SlsError {
    fn from(err: serde_json::Error) -> Self {
        SlsError::Serialization(SerializationError::Json {
            reason: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for SlsError {
    fn from(err: serde_yaml::Error) -> Self {
        SlsError::Serialization(SerializationError::Yaml {
            reason: err.to_string(),
        })
    }
}

impl SlsError {
    /// Whether a caller may reasonably repeat the operation. Nothing in this
    /// crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            SlsError::Pstore(PstoreError::System { .. }) => true,
            SlsError::Pstore(_) => false,
            SlsError::Config(_) => false,
            SlsError::Naming(_) => false,
            SlsError::Serialization(_) => false,
            _ => true,
        }
    }
}
