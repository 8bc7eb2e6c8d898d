//! Registration endpoint and token rotation tests

use std::sync::Arc;
use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use test_deployer::app::options::{ClientOptions, EnvSettings};
use test_deployer::authn::registration::RegistrationClient;
use test_deployer::authn::token_mngr::{token_source_from_env, AuthSession, TokenRefreshOptions};
use test_deployer::utils::RetryOptions;
use test_deployer::workers::poller;
use test_deployer::{Bodies, DeployError, Deployer};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn registration_client(mock_server: &MockServer, retry: RetryOptions) -> RegistrationClient {
    RegistrationClient::new(
        reqwest::Client::new(),
        &format!("{}/registration", mock_server.uri()),
        SecretString::from("team-token".to_string()),
        retry,
    )
    .expect("valid registration url")
}

fn fast_retry() -> RetryOptions {
    RetryOptions {
        retries: 5,
        delay: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn test_registration_retries_until_token_arrives() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/registration"))
        .and(header("authorization", "Bearer team-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .up_to_n_times(3)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/registration"))
        .and(header("authorization", "Bearer team-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t1" })))
        .mount(&mock_server)
        .await;

    let client = registration_client(&mock_server, RetryOptions::default());
    let started = Instant::now();
    let token = client.fetch_token_with_retry().await.expect("token");

    assert_eq!(token.expose_secret(), "t1");
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 4);
    // three 500ms pauses between the four attempts
    assert!(started.elapsed() >= Duration::from_millis(1500));
}

#[tokio::test]
async fn test_registration_gives_up_after_retry_budget() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/registration"))
        .respond_with(ResponseTemplate::new(500))
        .expect(6)
        .mount(&mock_server)
        .await;

    let client = registration_client(&mock_server, fast_retry());
    let err = client.fetch_token_with_retry().await.unwrap_err();

    match err {
        DeployError::TokenFetch { attempts, message } => {
            assert_eq!(attempts, 6);
            assert!(message.contains("Unexpected status from registration: 500"));
        }
        other => panic!("expected TokenFetch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_registration_null_body_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/registration"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/registration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t2" })))
        .mount(&mock_server)
        .await;

    let client = registration_client(&mock_server, fast_retry());
    let token = client.fetch_token_with_retry().await.expect("token");
    assert_eq!(token.expose_secret(), "t2");
}

#[tokio::test]
async fn test_static_token_skips_registration() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/registration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t1" })))
        .expect(0)
        .mount(&mock_server)
        .await;

    let settings = EnvSettings {
        static_token: Some(SecretString::from("static".to_string())),
        team_token: Some(SecretString::from("team-token".to_string())),
        registration_url: Some(format!("{}/registration", mock_server.uri())),
        ..Default::default()
    };
    let source = token_source_from_env(&settings, reqwest::Client::new(), fast_retry())
        .unwrap_or_else(|e| panic!("token source: {}", e));
    let session = AuthSession::new(source, TokenRefreshOptions::default());

    assert_eq!(session.bearer().await.unwrap(), "static");
}

#[tokio::test]
async fn test_deploy_rotates_registered_tokens() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/registration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t1" })))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/registration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t2" })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2/now/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v6/now/deployments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "dpl_9",
            "url": "test2020-9.now.sh",
        })))
        .mount(&mock_server)
        .await;

    // 9 pending checks then READY: 1 upload + 1 create + 10 checks = 12 API calls
    Mock::given(method("GET"))
        .and(path("/v3/now/deployments/dpl_9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "state": "BUILDING" })))
        .up_to_n_times(9)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v3/now/deployments/dpl_9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "state": "READY" })))
        .mount(&mock_server)
        .await;

    let source = registration_client(&mock_server, fast_retry());
    let session = Arc::new(AuthSession::new(
        Box::new(source),
        TokenRefreshOptions::default(),
    ));
    let options = ClientOptions {
        base_url: mock_server.uri(),
        poller: poller::Options {
            interval: Duration::from_millis(5),
            max_attempts: 750,
        },
        ..Default::default()
    };
    let deployer = Deployer::new(options, session.clone()).expect("deployer");

    let mut bodies = Bodies::new();
    bodies.insert("now.json".to_string(), b"{}".to_vec());
    bodies.insert("index.html".to_string(), b"<h1>hi</h1>".to_vec());

    deployer.deploy(&bodies, "rot").await.expect("deploy failed");

    assert_eq!(session.refresh_count().await, 2);

    let requests = mock_server.received_requests().await.unwrap();
    let api_calls: Vec<_> = requests
        .iter()
        .filter(|r| r.url.path() != "/registration")
        .collect();
    assert_eq!(api_calls.len(), 12);

    // calls 1..=10 use the first token, the 11th call triggers the second fetch
    for (index, request) in api_calls.iter().enumerate() {
        let expected = if index < 10 { "Bearer t1" } else { "Bearer t2" };
        assert_eq!(request.headers.get("authorization").unwrap(), expected);
    }
}
