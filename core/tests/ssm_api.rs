use aws_sdk_ssm::config::retry::RetryConfig;
use aws_sdk_ssm::config::{BehaviorVersion, Credentials, Region};
use serde_json::json;
use sls_core::pstore::{Client, SsmApi};
use wiremock::matchers::{body_partial_json, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

fn create_test_ssm_api(server: &MockServer) -> SsmApi {
    let config = aws_sdk_ssm::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(Credentials::new("test", "test", None, None, "test"))
        .endpoint_url(server.uri())
        .retry_config(RetryConfig::disabled())
        .build();
    SsmApi::new(aws_sdk_ssm::Client::from_conf(config))
}

fn target(operation: &str) -> String {
    format!("AmazonSSM.{}", operation)
}

fn ok_json(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), JSON_CONTENT_TYPE)
}

fn error_json(code: &str) -> ResponseTemplate {
    ResponseTemplate::new(400)
        .insert_header("x-amzn-errortype", code)
        .set_body_raw(
            json!({ "__type": code, "message": "test error" }).to_string(),
            JSON_CONTENT_TYPE,
        )
}

#[tokio::test]
async fn test_get_parameter_with_decryption() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("GetParameter").as_str()))
        .and(body_partial_json(json!({ "Name": "/app/secret", "WithDecryption": true })))
        .respond_with(ok_json(json!({
            "Parameter": { "Name": "/app/secret", "Value": "s3cr3t", "Type": "SecureString" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(create_test_ssm_api(&server), true);
    assert_eq!(client.get("/app/secret").await.unwrap(), "s3cr3t");
}

#[tokio::test]
async fn test_parameter_not_found_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("GetParameter").as_str()))
        .respond_with(error_json("ParameterNotFound"))
        .mount(&server)
        .await;

    let client = Client::new(create_test_ssm_api(&server), false);
    let err = client.get("/app/missing").await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {:?}", err);
}

#[tokio::test]
async fn test_other_service_errors_are_system() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(error_json("ValidationException"))
        .mount(&server)
        .await;

    let client = Client::new(create_test_ssm_api(&server), false);
    let err = client.get("/app/db").await.unwrap_err();
    assert!(err.is_system(), "unexpected error: {:?}", err);
}

#[tokio::test]
async fn test_get_by_path_follows_next_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("GetParametersByPath").as_str()))
        .and(body_partial_json(json!({ "NextToken": "page-2" })))
        .respond_with(ok_json(json!({
            "Parameters": [ { "Name": "/cfg/b", "Value": "2" } ]
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("GetParametersByPath").as_str()))
        .and(body_partial_json(json!({ "Path": "/cfg", "Recursive": true })))
        .respond_with(ok_json(json!({
            "Parameters": [ { "Name": "/cfg/a", "Value": "1" } ],
            "NextToken": "page-2"
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(create_test_ssm_api(&server), false);
    let params = client.get_by_path("cfg", true).await.unwrap();
    assert_eq!(params.len(), 2);
    assert_eq!(params.get("/cfg/a").map(String::as_str), Some("1"));
    assert_eq!(params.get("/cfg/b").map(String::as_str), Some("2"));
}

#[tokio::test]
async fn test_get_many_returns_invalid_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("GetParameters").as_str()))
        .and(body_partial_json(json!({ "Names": ["/a", "/nope"] })))
        .respond_with(ok_json(json!({
            "Parameters": [ { "Name": "/a", "Value": "1" } ],
            "InvalidParameters": ["/nope"]
        })))
        .mount(&server)
        .await;

    let client = Client::new(create_test_ssm_api(&server), false);
    let set = client.get_many(&["/a", "/nope"]).await.unwrap();
    assert_eq!(set.parameters.get("/a").map(String::as_str), Some("1"));
    assert_eq!(set.invalid, vec!["/nope"]);
}

#[tokio::test]
async fn test_put_creates_standard_string_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("GetParameter").as_str()))
        .respond_with(error_json("ParameterNotFound"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("PutParameter").as_str()))
        .and(body_partial_json(json!({
            "Name": "/app/new",
            "Value": "v1",
            "Overwrite": false,
            "Type": "String",
            "Tier": "Standard"
        })))
        .respond_with(ok_json(json!({ "Version": 1, "Tier": "Standard" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(create_test_ssm_api(&server), false);
    assert_eq!(client.put("/app/new", "v1", false).await.unwrap(), "");
}

#[tokio::test]
async fn test_delete_reads_then_deletes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("GetParameter").as_str()))
        .respond_with(ok_json(json!({
            "Parameter": { "Name": "/app/old", "Value": "bye" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", target("DeleteParameter").as_str()))
        .and(body_partial_json(json!({ "Name": "/app/old" })))
        .respond_with(ok_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(create_test_ssm_api(&server), false);
    assert_eq!(client.delete("/app/old").await.unwrap(), "bye");
}
