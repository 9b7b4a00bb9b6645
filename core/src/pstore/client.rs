use std::collections::BTreeMap;
use std::pin::pin;

use futures::stream::{self, Stream, TryStreamExt};
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::{ApiError, PstoreError};
use crate::pstore::{
    BatchRequest, DeleteRequest, GetRequest, PATH_SEPARATOR, ParameterApi, ParameterPage,
    ParameterTier, ParameterType, PathRequest, PutRequest,
};

pub type PstoreResult<T> = std::result::Result<T, PstoreError>;

/// Result of a batch fetch: values for every known key plus the keys the
/// store did not recognise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParameterSet {
    pub parameters: BTreeMap<String, String>,
    pub invalid: Vec<String>,
}

/// Parameter store client used for managing configuration data of
/// microservices. Every call goes to the remote store; nothing is cached.
pub struct Client<A> {
    api: A,
    is_encrypted: bool,
}

impl<A: ParameterApi> Client<A> {
    pub fn new(api: A, is_encrypted: bool) -> Self {
        Self { api, is_encrypted }
    }

    pub fn is_encrypted(&self) -> bool {
        self.is_encrypted
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Retrieves a single parameter. An absent key is `NotFound`; a key
    /// without a value yields an empty string.
    pub async fn get(&self, key: &str) -> PstoreResult<String> {
        if key.is_empty() {
            return Err(PstoreError::invalid_input(
                "key is empty, a non empty key is required",
            ));
        }

        debug!("Fetching parameter {}", key);
        let record = self
            .api
            .get_parameter(GetRequest {
                name: key.to_string(),
                with_decryption: self.is_encrypted,
            })
            .await
            .map_err(|e| PstoreError::from_api(e, "GetParameter", key))?;

        Ok(record.and_then(|r| r.value).unwrap_or_default())
    }

    /// Retrieves every parameter under `path`, following pagination to the
    /// end. The first failing page aborts the whole fetch.
    pub async fn get_by_path(
        &self,
        path: &str,
        recursive: bool,
    ) -> PstoreResult<BTreeMap<String, String>> {
        if path.is_empty() {
            return Err(PstoreError::invalid_input("path is empty"));
        }

        let path = ensure_path_prefix(path);
        let request = PathRequest {
            path: path.clone(),
            recursive,
            with_decryption: self.is_encrypted,
            next_token: None,
        };

        let mut result = BTreeMap::new();
        let mut pages = pin!(self.pages(request));
        let mut page_count = 0usize;
        while let Some(page) = pages
            .try_next()
            .await
            .map_err(|e| PstoreError::from_api(e, "GetParametersByPath", path.as_str()))?
        {
            page_count += 1;
            result.extend(page.parameters.into_iter().filter_map(|p| p.into_pair()));
        }

        debug!(
            "Fetched {} parameters under {} in {} pages",
            result.len(),
            path,
            page_count
        );
        Ok(result)
    }

    pub async fn get_by_path_recursive(&self, path: &str) -> PstoreResult<BTreeMap<String, String>> {
        self.get_by_path(path, true).await
    }

    /// Retrieves many parameters regardless of hierarchy in one request.
    pub async fn get_many<S: AsRef<str>>(&self, keys: &[S]) -> PstoreResult<ParameterSet> {
        if keys.is_empty() {
            return Err(PstoreError::invalid_input(
                "keys must have at least one key",
            ));
        }

        let names: Vec<String> = keys.iter().map(|k| k.as_ref().to_string()).collect();
        let target = names.join(",");
        debug!("Fetching {} parameters", names.len());

        let output = self
            .api
            .get_parameters(BatchRequest {
                names,
                with_decryption: self.is_encrypted,
            })
            .await
            .map_err(|e| PstoreError::System {
                operation: "GetParameters",
                target,
                source: e,
            })?;

        Ok(ParameterSet {
            parameters: output
                .parameters
                .into_iter()
                .filter_map(|p| p.into_pair())
                .collect(),
            invalid: output
                .invalid_parameters
                .into_iter()
                .filter(|name| !name.is_empty())
                .collect(),
        })
    }

    /// Removes a parameter and returns the value it held.
    pub async fn delete(&self, key: &str) -> PstoreResult<String> {
        let old = self.get(key).await?;

        self.api
            .delete_parameter(DeleteRequest {
                name: key.to_string(),
            })
            .await
            .map_err(|e| PstoreError::from_api(e, "DeleteParameter", key))?;

        info!("Deleted parameter {}", key);
        Ok(old)
    }

    /// Writes `value` only when it differs from what is stored. An existing
    /// parameter is replaced only when `overwrite` is set. Returns the prior
    /// value, empty when the parameter was created.
    pub async fn put(&self, key: &str, value: &str, overwrite: bool) -> PstoreResult<String> {
        let current = match self.get(key).await {
            Ok(old) => Some(old),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        if let Some(old) = &current {
            if old == value {
                debug!("Parameter {} already holds the requested value", key);
                return Ok(old.clone());
            }
            if !overwrite {
                return Err(PstoreError::Conflict {
                    key: key.to_string(),
                });
            }
        }

        self.api
            .put_parameter(PutRequest {
                name: key.to_string(),
                value: value.to_string(),
                overwrite,
                parameter_type: ParameterType::String,
                tier: ParameterTier::Standard,
            })
            .await
            .map_err(|e| PstoreError::System {
                operation: "PutParameter",
                target: key.to_string(),
                source: e,
            })?;

        info!(
            "{} parameter {}",
            if current.is_some() { "Overwrote" } else { "Created" },
            key
        );
        Ok(current.unwrap_or_default())
    }

    fn pages(
        &self,
        request: PathRequest,
    ) -> impl Stream<Item = Result<ParameterPage, ApiError>> + '_ {
        stream::try_unfold(Some(request), move |state| async move {
            let Some(request) = state else {
                return Ok::<_, ApiError>(None);
            };

            let mut next = request.clone();
            let page = self.api.get_parameters_by_path(request).await?;
            // An empty or repeated token ends the listing.
            next.next_token = page
                .next_token
                .clone()
                .filter(|token| !token.is_empty() && Some(token) != next.next_token.as_ref());
            let state = next.next_token.is_some().then_some(next);
            Ok(Some((page, state)))
        })
    }
}

/// Prepends the path separator when it is missing.
pub fn ensure_path_prefix(path: &str) -> String {
    if path.starts_with(PATH_SEPARATOR) {
        path.to_string()
    } else {
        format!("{}{}", PATH_SEPARATOR, path)
    }
}
