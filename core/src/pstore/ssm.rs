use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_ssm::Client;
use aws_sdk_ssm::config::http::HttpResponse;
use aws_sdk_ssm::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ssm::types::{self as ssm_types, Parameter};
use tracing::{debug, warn};

use crate::config::PstoreConfig;
use crate::errors::ApiError;
use crate::pstore::{
    BatchOutput, BatchRequest, DeleteRequest, GetRequest, ParameterApi, ParameterPage,
    ParameterRecord, ParameterTier, ParameterType, PathRequest, PutRequest,
};

const PARAMETER_NOT_FOUND: &str = "ParameterNotFound";

/// [`ParameterApi`] backed by AWS Systems Manager Parameter Store.
#[derive(Debug, Clone)]
pub struct SsmApi {
    client: Client,
}

impl SsmApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn from_config(config: &PstoreConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }

        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }

        if let Some(endpoint_url) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        if let Some(timeout_ms) = config.operation_timeout_ms {
            loader = loader.timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(Duration::from_millis(timeout_ms))
                    .build(),
            );
        }

        let sdk_config = loader.load().await;
        debug!(
            "SSM client configured for region {:?}",
            sdk_config.region().map(|r| r.as_ref().to_string())
        );

        Self::new(Client::new(&sdk_config))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn to_record(parameter: &Parameter) -> ParameterRecord {
    ParameterRecord {
        name: parameter.name().map(str::to_string),
        value: parameter.value().map(str::to_string),
    }
}

fn to_ssm_type(parameter_type: ParameterType) -> ssm_types::ParameterType {
    match parameter_type {
        ParameterType::String => ssm_types::ParameterType::String,
        ParameterType::StringList => ssm_types::ParameterType::StringList,
        ParameterType::SecureString => ssm_types::ParameterType::SecureString,
    }
}

fn to_ssm_tier(tier: ParameterTier) -> ssm_types::ParameterTier {
    match tier {
        ParameterTier::Standard => ssm_types::ParameterTier::Standard,
        ParameterTier::Advanced => ssm_types::ParameterTier::Advanced,
        ParameterTier::IntelligentTiering => ssm_types::ParameterTier::IntelligentTiering,
    }
}

/// Separates "parameter not found" from every other SDK failure.
fn classify<E>(err: SdkError<E, HttpResponse>, operation: &str, name: &str) -> ApiError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    if err.code() == Some(PARAMETER_NOT_FOUND) {
        debug!("{}: parameter {} not found", operation, name);
        return ApiError::ParameterNotFound {
            name: name.to_string(),
        };
    }

    warn!(
        "{} failed for {}: {}",
        operation,
        name,
        DisplayErrorContext(&err)
    );
    ApiError::service(err)
}

#[async_trait]
impl ParameterApi for SsmApi {
    async fn get_parameter(&self, request: GetRequest) -> Result<Option<ParameterRecord>, ApiError> {
        let output = self
            .client
            .get_parameter()
            .name(&request.name)
            .with_decryption(request.with_decryption)
            .send()
            .await
            .map_err(|e| classify(e, "GetParameter", &request.name))?;

        Ok(output.parameter().map(to_record))
    }

    async fn get_parameters(&self, request: BatchRequest) -> Result<BatchOutput, ApiError> {
        let target = request.names.join(",");
        let output = self
            .client
            .get_parameters()
            .set_names(Some(request.names))
            .with_decryption(request.with_decryption)
            .send()
            .await
            .map_err(|e| classify(e, "GetParameters", &target))?;

        Ok(BatchOutput {
            parameters: output.parameters().iter().map(to_record).collect(),
            invalid_parameters: output.invalid_parameters().to_vec(),
        })
    }

    async fn get_parameters_by_path(
        &self,
        request: PathRequest,
    ) -> Result<ParameterPage, ApiError> {
        let output = self
            .client
            .get_parameters_by_path()
            .path(&request.path)
            .recursive(request.recursive)
            .with_decryption(request.with_decryption)
            .set_next_token(request.next_token)
            .send()
            .await
            .map_err(|e| classify(e, "GetParametersByPath", &request.path))?;

        Ok(ParameterPage {
            parameters: output.parameters().iter().map(to_record).collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn put_parameter(&self, request: PutRequest) -> Result<(), ApiError> {
        self.client
            .put_parameter()
            .name(&request.name)
            .value(request.value)
            .overwrite(request.overwrite)
            .r#type(to_ssm_type(request.parameter_type))
            .tier(to_ssm_tier(request.tier))
            .send()
            .await
            .map_err(|e| classify(e, "PutParameter", &request.name))?;

        Ok(())
    }

    async fn delete_parameter(&self, request: DeleteRequest) -> Result<(), ApiError> {
        self.client
            .delete_parameter()
            .name(&request.name)
            .send()
            .await
            .map_err(|e| classify(e, "DeleteParameter", &request.name))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_conversion() {
        let parameter = Parameter::builder().name("/app/db").value("host").build();
        assert_eq!(to_record(&parameter), ParameterRecord::new("/app/db", "host"));

        let empty = Parameter::builder().build();
        assert_eq!(to_record(&empty), ParameterRecord::default());
    }

    #[test]
    fn test_put_request_mapping() {
        assert_eq!(
            to_ssm_type(ParameterType::String),
            ssm_types::ParameterType::String
        );
        assert_eq!(
            to_ssm_type(ParameterType::SecureString),
            ssm_types::ParameterType::SecureString
        );
        assert_eq!(
            to_ssm_tier(ParameterTier::Standard),
            ssm_types::ParameterTier::Standard
        );
        assert_eq!(
            to_ssm_tier(ParameterTier::IntelligentTiering),
            ssm_types::ParameterTier::IntelligentTiering
        );
    }
}
