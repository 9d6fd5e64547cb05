//! Login and token adoption against a mock HTTP server.

use std::time::Duration;

use assert_matches::assert_matches;
use fishpi_client::{ClientError, DispatcherConfig, FishpiClient};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> FishpiClient {
    FishpiClient::new(
        DispatcherConfig {
            base_url: server.uri(),
            user_agent: "fishpi-test/1.0".to_string(),
            request_timeout: Duration::from_secs(5),
            min_request_interval: Duration::ZERO,
        },
        "fishpi-test",
    )
}

fn profile_body(name: &str) -> serde_json::Value {
    json!({
        "code": 0,
        "data": {
            "oId": "1700000000000",
            "userName": name,
            "userNickname": "",
            "userPoint": 500,
            "sysMetal": ""
        }
    })
}

#[tokio::test]
async fn login_stores_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/getKey"))
        .and(body_json(json!({
            "nameOrEmail": "bob",
            "userPassword": "5f4dcc3b5aa765d61d8327deb882cf99",
            "mfaCode": "123456"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0, "Key": "fresh-token-abc"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let token = client
        .auth()
        .login("bob", "password", Some("123456"))
        .await
        .unwrap();
    assert_eq!(token, "fresh-token-abc");
    assert_eq!(client.dispatcher().token().as_deref(), Some("fresh-token-abc"));
}

#[tokio::test]
async fn wrong_password_is_auth_error_and_token_stays_unset() {
    let server = MockServer::start().await;
    Mock::given(path("/api/getKey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": -1, "msg": "wrong password"})))
        .mount(&server)
        .await;
    Mock::given(path("/api/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body("bob")))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.auth().login("bob", "wrong", Some("")).await.unwrap_err();
    assert_matches!(err, ClientError::Auth { message } if message == "wrong password");
    assert!(client.dispatcher().token().is_none());

    let next = client.auth().profile().await.unwrap_err();
    assert!(next.is_auth());
}

#[tokio::test]
async fn failed_login_keeps_existing_token() {
    let server = MockServer::start().await;
    Mock::given(path("/api/getKey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": -1, "msg": "nope"})))
        .mount(&server)
        .await;

    let client = client(&server);
    client.dispatcher().set_token("still-valid");
    let _ = client.auth().login("bob", "wrong", None).await.unwrap_err();
    assert_eq!(client.dispatcher().token().as_deref(), Some("still-valid"));
}

#[tokio::test]
async fn empty_key_in_success_response_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(path("/api/getKey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0, "Key": ""})))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.auth().login("bob", "pw", None).await.unwrap_err();
    assert!(err.is_auth());
    assert!(client.dispatcher().token().is_none());
}

#[tokio::test]
async fn login_with_valid_token_returns_profile() {
    let server = MockServer::start().await;
    Mock::given(path("/api/user"))
        .and(query_param("apiKey", "good-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body("alice")))
        .mount(&server)
        .await;

    let client = client(&server);
    let profile = client.auth().login_with_token("good-token").await.unwrap();
    assert_eq!(profile.user_name, "alice");
    assert_eq!(profile.display_name(), "alice");
    assert!(client.auth().is_logged_in());
}

#[tokio::test]
async fn login_with_expired_token_clears_it() {
    let server = MockServer::start().await;
    Mock::given(path("/api/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": -1, "msg": "invalid key"})))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.auth().login_with_token("expired-token").await.unwrap_err();
    assert_matches!(err, ClientError::Auth { message } if message.contains("invalid key"));
    assert!(client.dispatcher().token().is_none());
}

#[tokio::test]
async fn login_with_token_restores_previous_token_on_failure() {
    let server = MockServer::start().await;
    Mock::given(path("/api/user"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let client = client(&server);
    client.dispatcher().set_token("previous");
    let _ = client.auth().login_with_token("bad").await.unwrap_err();
    assert_eq!(client.dispatcher().token().as_deref(), Some("previous"));
}

#[tokio::test]
async fn validate_reports_false_on_rejection() {
    let server = MockServer::start().await;
    Mock::given(path("/api/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": -1, "msg": "invalid key"})))
        .mount(&server)
        .await;

    let client = client(&server);
    client.dispatcher().set_token("stale");
    assert!(!client.auth().validate().await.unwrap());
}

#[tokio::test]
async fn validate_reports_true_on_profile() {
    let server = MockServer::start().await;
    Mock::given(path("/api/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body("bob")))
        .mount(&server)
        .await;

    let client = client(&server);
    client.dispatcher().set_token("good");
    assert!(client.auth().validate().await.unwrap());
}

#[tokio::test]
async fn profile_without_data_is_decode_failed() {
    let server = MockServer::start().await;
    Mock::given(path("/api/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0})))
        .mount(&server)
        .await;

    let client = client(&server);
    client.dispatcher().set_token("good");
    assert_matches!(
        client.auth().profile().await,
        Err(ClientError::DecodeFailed { .. })
    );
}
