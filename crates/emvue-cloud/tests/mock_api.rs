//! Mock-server tests for the cloud session pipeline.
//!
//! These use wiremock to stand in for both the metering API and the
//! identity provider, covering credential acquisition, expiry-driven
//! refresh, 401 remediation, and retry exhaustion without real network
//! access. Retry tests zero the backoff ceiling so they run instantly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use http::Method;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use emvue_cloud::{CloudConfig, CloudSession};
use emvue_core::error::AuthError;
use emvue_core::{ApiRequest, ApiSession, ApiUrl, Credentials, Error, RetryPolicy, TokenSet};

fn epoch_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// Build an unsigned three-segment token with the given expiry.
fn jwt(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#).as_bytes());
    format!("{header}.{payload}.signature")
}

fn token_set(access: &str, id: &str, refresh: &str) -> TokenSet {
    TokenSet {
        access_token: Some(access.to_string()),
        id_token: Some(id.to_string()),
        refresh_token: Some(refresh.to_string()),
        token_type: Some("Bearer".to_string()),
    }
}

fn identity_result(access: &str, id: &str, refresh: Option<&str>) -> serde_json::Value {
    let mut result = json!({
        "AccessToken": access,
        "IdToken": id,
        "TokenType": "Bearer",
        "ExpiresIn": 3600,
    });
    if let Some(refresh) = refresh {
        result["RefreshToken"] = json!(refresh);
    }
    json!({ "AuthenticationResult": result, "ChallengeParameters": {} })
}

fn config(api: &MockServer, identity: &MockServer) -> CloudConfig {
    CloudConfig::new(ApiUrl::new(api.uri()).unwrap())
        .credentials(Credentials::for_refresh("alice@example.com"))
        .identity_endpoint(identity.uri(), "test-client")
}

fn no_backoff(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::from_secs(max_attempts, 0.5, 0.0)
}

#[tokio::test]
async fn valid_token_dispatches_without_refresh() {
    let api = MockServer::start().await;
    let identity = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&identity)
        .await;

    Mock::given(method("GET"))
        .and(path("/customers"))
        .and(header("authtoken", "id-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"customerGid": 1})))
        .expect(1)
        .mount(&api)
        .await;

    let session = CloudSession::new(
        config(&api, &identity).tokens(token_set(&jwt(epoch_now() + 3600), "id-1", "refresh-1")),
    );

    let response = session.get("customers").await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn expired_token_refreshes_before_first_attempt() {
    let api = MockServer::start().await;
    let identity = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"AuthFlow": "REFRESH_TOKEN_AUTH"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(identity_result(
            &jwt(epoch_now() + 3600),
            "id-2",
            None,
        )))
        .expect(1)
        .mount(&identity)
        .await;

    // The request that follows the refresh must carry the new identity
    // token.
    Mock::given(method("GET"))
        .and(path("/customers"))
        .and(header("authtoken", "id-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"customerGid": 1})))
        .expect(1)
        .mount(&api)
        .await;

    let session = CloudSession::new(
        config(&api, &identity).tokens(token_set(&jwt(epoch_now() - 60), "id-1", "refresh-1")),
    );

    let response = session.get("customers").await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn single_401_triggers_one_reauth_and_one_reissue() {
    let api = MockServer::start().await;
    let identity = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(identity_result(
            &jwt(epoch_now() + 3600),
            "id-new",
            None,
        )))
        .expect(1)
        .mount(&identity)
        .await;

    Mock::given(method("GET"))
        .and(path("/customers"))
        .and(header("authtoken", "id-old"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&api)
        .await;

    Mock::given(method("GET"))
        .and(path("/customers"))
        .and(header("authtoken", "id-new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"customerGid": 1})))
        .expect(1)
        .mount(&api)
        .await;

    let session = CloudSession::new(
        config(&api, &identity).tokens(token_set(&jwt(epoch_now() + 3600), "id-old", "refresh-1")),
    );

    let response = session.get("customers").await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn second_401_is_returned_not_retried() {
    let api = MockServer::start().await;
    let identity = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(identity_result(
            &jwt(epoch_now() + 3600),
            "id-new",
            None,
        )))
        .expect(1)
        .mount(&identity)
        .await;

    // Unauthorized no matter which token is presented.
    Mock::given(method("GET"))
        .and(path("/customers"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "denied"})))
        .expect(2)
        .mount(&api)
        .await;

    let session = CloudSession::new(
        config(&api, &identity).tokens(token_set(&jwt(epoch_now() + 3600), "id-old", "refresh-1")),
    );

    let response = session.get("customers").await.unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn consecutive_server_errors_exhaust_the_budget() {
    let api = MockServer::start().await;
    let identity = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/customers"))
        .respond_with(ResponseTemplate::new(503))
        .expect(5)
        .mount(&api)
        .await;

    let session = CloudSession::new(
        config(&api, &identity)
            .tokens(token_set(&jwt(epoch_now() + 3600), "id-1", "refresh-1"))
            .retry(no_backoff(5)),
    );

    let err = session.get("customers").await.unwrap_err();
    assert!(matches!(err, Error::RetriesExhausted { attempts: 5 }));
}

#[tokio::test]
async fn extra_attempt_in_the_budget_recovers() {
    let api = MockServer::start().await;
    let identity = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/customers"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(5)
        .expect(5)
        .mount(&api)
        .await;

    Mock::given(method("GET"))
        .and(path("/customers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"customerGid": 1})))
        .expect(1)
        .mount(&api)
        .await;

    let session = CloudSession::new(
        config(&api, &identity)
            .tokens(token_set(&jwt(epoch_now() + 3600), "id-1", "refresh-1"))
            .retry(no_backoff(6)),
    );

    let response = session.get("customers").await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn password_is_cleared_after_first_successful_exchange() {
    let api = MockServer::start().await;
    let identity = MockServer::start().await;

    // The provider issues no refresh credential here, so once the password
    // is gone there is no way back in.
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "AuthFlow": "USER_PASSWORD_AUTH",
            "AuthParameters": {"USERNAME": "alice@example.com", "PASSWORD": "hunter2"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(identity_result(
            &jwt(epoch_now() + 3600),
            "id-1",
            None,
        )))
        .expect(1)
        .mount(&identity)
        .await;

    let sink_calls = Arc::new(AtomicUsize::new(0));
    let sink_count = sink_calls.clone();

    let session = CloudSession::new(
        config(&api, &identity)
            .credentials(Credentials::new("Alice@Example.com", "hunter2"))
            .on_token_update(move |_| {
                sink_count.fetch_add(1, Ordering::SeqCst);
            }),
    );

    let tokens = session.authenticate().await.unwrap();
    assert!(tokens.access_token.is_some());
    assert_eq!(sink_calls.load(Ordering::SeqCst), 1);

    let err = session.authenticate().await.unwrap_err();
    assert!(matches!(err, Error::Auth(AuthError::NotAuthenticated)));
    assert_eq!(sink_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn refresh_only_session_uses_the_refresh_flow() {
    let api = MockServer::start().await;
    let identity = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"AuthFlow": "USER_PASSWORD_AUTH"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&identity)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "AuthFlow": "REFRESH_TOKEN_AUTH",
            "AuthParameters": {"REFRESH_TOKEN": "refresh-1"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(identity_result(
            &jwt(epoch_now() + 3600),
            "id-2",
            None,
        )))
        .expect(1)
        .mount(&identity)
        .await;

    let session = CloudSession::new(
        config(&api, &identity).tokens(token_set(&jwt(epoch_now() + 3600), "id-1", "refresh-1")),
    );

    let tokens = session.authenticate().await.unwrap();
    assert_eq!(tokens.id_token.as_deref(), Some("id-2"));
    // The flow does not rotate the refresh credential; the old one is
    // carried into the new snapshot.
    assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(session.tokens().refresh_token.as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn sink_observes_the_new_snapshot() {
    let api = MockServer::start().await;
    let identity = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(identity_result(
            &jwt(epoch_now() + 3600),
            "id-2",
            Some("refresh-2"),
        )))
        .mount(&identity)
        .await;

    let seen: Arc<Mutex<Option<TokenSet>>> = Arc::new(Mutex::new(None));
    let seen_in_sink = seen.clone();

    let session = CloudSession::new(
        config(&api, &identity)
            .tokens(token_set(&jwt(epoch_now() + 3600), "id-1", "refresh-1"))
            .on_token_update(move |tokens| {
                *seen_in_sink.lock().unwrap() = Some(tokens.clone());
            }),
    );

    session.authenticate().await.unwrap();

    let seen = seen.lock().unwrap().clone().unwrap();
    assert_eq!(seen.id_token.as_deref(), Some("id-2"));
    assert_eq!(seen.refresh_token.as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn rejected_principal_surfaces_as_authentication_error() {
    let api = MockServer::start().await;
    let identity = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "NotAuthorizedException",
            "message": "Incorrect username or password."
        })))
        .expect(1)
        .mount(&identity)
        .await;

    let session = CloudSession::new(
        config(&api, &identity).credentials(Credentials::new("alice@example.com", "wrong")),
    );

    let err = session.authenticate().await.unwrap_err();
    match err {
        Error::Auth(AuthError::Rejected { message }) => {
            assert!(message.contains("NotAuthorizedException"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn dispatch_without_credentials_fails_fast() {
    // No servers at all: the call must not reach the network.
    let session = CloudSession::new(CloudConfig::new(
        ApiUrl::new("http://127.0.0.1:1").unwrap(),
    ));

    let err = session.get("customers").await.unwrap_err();
    assert!(matches!(err, Error::Auth(AuthError::NotAuthenticated)));
}

#[tokio::test]
async fn undecodable_access_token_fails_before_dispatching() {
    let session = CloudSession::new(
        CloudConfig::new(ApiUrl::new("http://127.0.0.1:1").unwrap())
            .credentials(Credentials::for_refresh("alice@example.com"))
            .tokens(token_set("not-a-jwt", "id-1", "refresh-1")),
    );

    let err = session.get("customers").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Auth(AuthError::MalformedToken { .. })
    ));
}

#[tokio::test]
async fn transport_error_passes_through_on_final_attempt() {
    // Nothing listens on port 1; every attempt fails at connect time.
    let session = CloudSession::new(
        CloudConfig::new(ApiUrl::new("http://127.0.0.1:1").unwrap())
            .credentials(Credentials::for_refresh("alice@example.com"))
            .tokens(token_set(&jwt(epoch_now() + 3600), "id-1", "refresh-1"))
            .retry(no_backoff(2)),
    );

    let err = session.get("customers").await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn caller_headers_cannot_override_the_identity_header() {
    let api = MockServer::start().await;
    let identity = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/customers"))
        .and(header("authtoken", "id-real"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"customerGid": 1})))
        .expect(1)
        .mount(&api)
        .await;

    let session = CloudSession::new(
        config(&api, &identity).tokens(token_set(&jwt(epoch_now() + 3600), "id-real", "refresh-1")),
    );

    let spoofed = ApiRequest::new().with_header(
        http::HeaderName::from_static("authtoken"),
        http::HeaderValue::from_static("id-spoofed"),
    );
    let response = session
        .dispatch(Method::GET, "customers", spoofed)
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn incomplete_stored_tokens_are_ignored() {
    let api = MockServer::start().await;
    let identity = MockServer::start().await;

    let session = CloudSession::new(config(&api, &identity).tokens(TokenSet {
        id_token: Some("id-only".to_string()),
        ..TokenSet::default()
    }));

    // Nothing usable was restored, and there is no password either.
    let err = session.get("customers").await.unwrap_err();
    assert!(matches!(err, Error::Auth(AuthError::NotAuthenticated)));
}
