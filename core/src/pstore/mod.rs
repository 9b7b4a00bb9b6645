//! Parameter store access.
//!
//! [`Client`] implements the read/write protocol (get, path fetch, batch
//! fetch, delete, conditional put) against anything implementing
//! [`ParameterApi`]. [`SsmApi`] talks to AWS Systems Manager;
//! [`MemoryParameterStore`] keeps everything in process.

mod client;
pub mod memory;
pub mod ssm;

use async_trait::async_trait;

use crate::errors::ApiError;

pub use client::{Client, ParameterSet, PstoreResult, ensure_path_prefix};
pub use memory::MemoryParameterStore;
pub use ssm::SsmApi;

pub const PATH_SEPARATOR: char = '/';

/// A parameter as returned by the remote store. Either field may be absent
/// in a malformed response; callers skip such records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterRecord {
    pub name: Option<String>,
    pub value: Option<String>,
}

impl ParameterRecord {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
        }
    }

    pub fn into_pair(self) -> Option<(String, String)> {
        match (self.name, self.value) {
            (Some(name), Some(value)) => Some((name, value)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRequest {
    pub name: String,
    pub with_decryption: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub names: Vec<String>,
    pub with_decryption: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutput {
    pub parameters: Vec<ParameterRecord>,
    /// Names the store does not know about.
    pub invalid_parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRequest {
    pub path: String,
    pub recursive: bool,
    pub with_decryption: bool,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterPage {
    pub parameters: Vec<ParameterRecord>,
    /// `None` once the last page has been returned.
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParameterType {
    #[default]
    String,
    StringList,
    SecureString,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParameterTier {
    #[default]
    Standard,
    Advanced,
    IntelligentTiering,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRequest {
    pub name: String,
    pub value: String,
    pub overwrite: bool,
    pub parameter_type: ParameterType,
    pub tier: ParameterTier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub name: String,
}

/// The five remote operations the client needs from a parameter store.
///
/// Implementations report an absent key as [`ApiError::ParameterNotFound`];
/// everything else is [`ApiError::Service`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParameterApi: Send + Sync {
    async fn get_parameter(&self, request: GetRequest) -> Result<Option<ParameterRecord>, ApiError>;

    async fn get_parameters(&self, request: BatchRequest) -> Result<BatchOutput, ApiError>;

    async fn get_parameters_by_path(&self, request: PathRequest)
    -> Result<ParameterPage, ApiError>;

    async fn put_parameter(&self, request: PutRequest) -> Result<(), ApiError>;

    async fn delete_parameter(&self, request: DeleteRequest) -> Result<(), ApiError>;
}
