use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::errors::ApiError;
use crate::pstore::{
    BatchOutput, BatchRequest, DeleteRequest, GetRequest, PATH_SEPARATOR, ParameterApi,
    ParameterPage, ParameterRecord, PathRequest, PutRequest,
};

const DEFAULT_PAGE_SIZE: usize = 10;

/// In-process parameter store with the same path and paging rules as SSM.
/// Useful for local runs and tests.
#[derive(Debug)]
pub struct MemoryParameterStore {
    parameters: Mutex<BTreeMap<String, String>>,
    page_size: usize,
    writes: AtomicUsize,
}

impl Default for MemoryParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryParameterStore {
    pub fn new() -> Self {
        Self {
            parameters: Mutex::new(BTreeMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
            writes: AtomicUsize::new(0),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_parameters<I, K, V>(self, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.lock()
            .extend(parameters.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Number of successful put calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.parameters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Whether `name` sits under `path`, directly or (when recursive) deeper.
fn is_under(path: &str, name: &str, recursive: bool) -> bool {
    let base = format!("{}{}", path.trim_end_matches(PATH_SEPARATOR), PATH_SEPARATOR);
    match name.strip_prefix(&base) {
        Some(rest) if !rest.is_empty() => recursive || !rest.contains(PATH_SEPARATOR),
        _ => false,
    }
}

#[async_trait]
impl ParameterApi for MemoryParameterStore {
    async fn get_parameter(&self, request: GetRequest) -> Result<Option<ParameterRecord>, ApiError> {
        self.lock()
            .get(&request.name)
            .map(|value| Some(ParameterRecord::new(request.name.clone(), value.clone())))
            .ok_or(ApiError::ParameterNotFound { name: request.name })
    }

    async fn get_parameters(&self, request: BatchRequest) -> Result<BatchOutput, ApiError> {
        let parameters = self.lock();
        let mut output = BatchOutput::default();
        for name in request.names {
            match parameters.get(&name) {
                Some(value) => output
                    .parameters
                    .push(ParameterRecord::new(name, value.clone())),
                None => output.invalid_parameters.push(name),
            }
        }
        Ok(output)
    }

    async fn get_parameters_by_path(
        &self,
        request: PathRequest,
    ) -> Result<ParameterPage, ApiError> {
        let start = match &request.next_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| ApiError::service(format!("invalid next token: {}", token)))?,
            None => 0,
        };

        let parameters = self.lock();
        let matching: Vec<(&String, &String)> = parameters
            .iter()
            .filter(|(name, _)| is_under(&request.path, name, request.recursive))
            .collect();

        let end = start.saturating_add(self.page_size).min(matching.len());
        let page = matching
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|(name, value)| ParameterRecord::new(name.as_str(), value.as_str()))
            .collect();

        Ok(ParameterPage {
            parameters: page,
            next_token: (end < matching.len()).then(|| end.to_string()),
        })
    }

    async fn put_parameter(&self, request: PutRequest) -> Result<(), ApiError> {
        if request.value.is_empty() {
            return Err(ApiError::service(format!(
                "parameter {} requires a non empty value",
                request.name
            )));
        }

        let mut parameters = self.lock();
        if parameters.contains_key(&request.name) && !request.overwrite {
            return Err(ApiError::service(format!(
                "parameter {} already exists",
                request.name
            )));
        }

        parameters.insert(request.name, request.value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_parameter(&self, request: DeleteRequest) -> Result<(), ApiError> {
        match self.lock().remove(&request.name) {
            Some(_) => Ok(()),
            None => Err(ApiError::ParameterNotFound { name: request.name }),
        }
    }
}
