//! Tests for the HTTP bundle transport

use std::time::Duration;

use storm_content::{BundleTransport, ContentConfig, Environment, FetchError, HttpBundleTransport};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport_for(server: &MockServer, max_bundle_size: u64) -> HttpBundleTransport {
    let config = ContentConfig {
        content_base_url: server.uri(),
        app_id: "STORM-1-1".to_string(),
        max_bundle_size,
        timeout: Duration::from_secs(5),
        ..Default::default()
    }
    .with_environment(Environment::Test);
    HttpBundleTransport::new(&config).unwrap()
}

#[tokio::test]
async fn test_fetch_full_bundle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0/apps/STORM-1-1/bundle"))
        .and(query_param("environment", "test"))
        .and(query_param("density", "x1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
        .expect(1)
        .mount(&server)
        .await;

    let data = transport_for(&server, 1024).fetch_full().await.unwrap();
    assert_eq!(data, Some(vec![1, 2, 3]));
}

#[tokio::test]
async fn test_fetch_delta_sends_timestamp() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0/apps/STORM-1-1/update"))
        .and(query_param("since", "1422353600"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"delta".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let data = transport_for(&server, 1024)
        .fetch_delta(1_422_353_600)
        .await
        .unwrap();
    assert_eq!(data, Some(b"delta".to_vec()));
}

#[tokio::test]
async fn test_no_content_means_nothing_new() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0/apps/STORM-1-1/update"))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let data = transport_for(&server, 1024).fetch_delta(1).await.unwrap();
    assert!(data.is_none());
}

#[tokio::test]
async fn test_http_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = transport_for(&server, 1024).fetch_full().await;
    assert!(matches!(result, Err(FetchError::HttpError(404))));
}

#[tokio::test]
async fn test_oversized_bundle_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 4096]))
        .mount(&server)
        .await;

    let result = transport_for(&server, 1024).fetch_full().await;
    assert!(matches!(
        result,
        Err(FetchError::TooLarge { max: 1024, .. })
    ));
}
