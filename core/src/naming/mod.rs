pub mod layout;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use aws_sdk_lambda::types::Environment;
use serde::{Deserialize, Serialize};

use crate::errors::NamingError;

pub use layout::{Service, ServiceLayout};

pub const DEFAULT_APP_DIR: &str = "app";
pub const DEFAULT_LAMBDA_DIR: &str = "lambdas";
pub const DEFAULT_BUILD_DIR: &str = "build";

/// The event source that invokes a deployed function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LambdaTrigger {
    ApiGateway,
    DynamoDb,
    Direct,
    Cognito,
    S3,
    Sns,
    Sqs,
}

impl LambdaTrigger {
    pub const ALL: [LambdaTrigger; 7] = [
        LambdaTrigger::ApiGateway,
        LambdaTrigger::DynamoDb,
        LambdaTrigger::Direct,
        LambdaTrigger::Cognito,
        LambdaTrigger::S3,
        LambdaTrigger::Sns,
        LambdaTrigger::Sqs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LambdaTrigger::ApiGateway => "apigw",
            LambdaTrigger::DynamoDb => "ddb",
            LambdaTrigger::Direct => "direct",
            LambdaTrigger::Cognito => "cognito",
            LambdaTrigger::S3 => "s3",
            LambdaTrigger::Sns => "sns",
            LambdaTrigger::Sqs => "sqs",
        }
    }
}

impl fmt::Display for LambdaTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LambdaTrigger {
    type Err = NamingError;

    /// Case-insensitive; anything outside the registered triggers is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        LambdaTrigger::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| NamingError::UnknownTrigger {
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for LambdaTrigger {
    type Error = NamingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LambdaTrigger> for String {
    fn from(trigger: LambdaTrigger) -> Self {
        trigger.as_str().to_string()
    }
}

pub fn to_lambda_trigger(s: &str) -> Result<LambdaTrigger, NamingError> {
    s.parse()
}

/// Leading segment shared by every function deployed for an organization
/// or environment, e.g. `acme-dev`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prefix(String);

impl Prefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one deployable function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lambda {
    pub prefix: Prefix,
    pub service: String,
    pub trigger: LambdaTrigger,
    pub base_name: String,
    #[serde(default)]
    pub binary_name: String,
    #[serde(default)]
    pub binary_zip_name: String,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Lambda {
    pub fn new(
        prefix: Prefix,
        service: impl Into<String>,
        trigger: LambdaTrigger,
        base_name: impl Into<String>,
    ) -> Self {
        let base_name = base_name.into();
        Self {
            prefix,
            service: service.into(),
            trigger,
            binary_name: "bootstrap".to_string(),
            binary_zip_name: format!("{}.zip", base_name),
            base_name,
            env: BTreeMap::new(),
        }
    }

    pub fn add_env(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.env.insert(name.into(), value.into());
    }

    pub fn to_aws_env(&self) -> Environment {
        Environment::builder()
            .set_variables(Some(
                self.env
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ))
            .build()
    }

    pub fn trigger_dir(&self) -> PathBuf {
        PathBuf::from(self.trigger.as_str())
    }

    /// Code location relative to the lambdas directory: `{trigger}/{base_name}`.
    pub fn code_dir(&self) -> PathBuf {
        self.trigger_dir().join(&self.base_name)
    }

    pub fn qualified_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}_{}",
            self.prefix, self.service, self.trigger, self.base_name
        )
    }
}
