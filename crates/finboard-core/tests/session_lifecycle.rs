mod common;

use finboard_core::auth::{AuthError, AuthState, StoredCredentials, TokenStore};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{auth_client, credentials, harness, jwt};

#[tokio::test]
async fn login_persists_tokens_and_authenticates() {
    let server = MockServer::start().await;
    let access_token = jwt(42, 3600);

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "user@example.com", "password": "secret123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": access_token,
            "refreshToken": "r1",
            "user": { "id": 42, "email": "user@example.com" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, None);
    let session = h.sessions.login("user@example.com", "secret123").await.unwrap();

    assert!(session.is_authenticated);
    assert_eq!(session.user_id, Some(42));
    assert_eq!(h.sessions.state().await, AuthState::Authenticated);
    assert_eq!(
        h.storage.load().unwrap(),
        Some(StoredCredentials {
            access_token: access_token.clone(),
            refresh_token: Some("r1".to_string()),
            user_id: Some(42),
        })
    );

    // A fresh login is immediately valid
    assert!(h.sessions.validate_token().await);
    assert_eq!(h.sessions.state().await, AuthState::Authenticated);
}

#[tokio::test]
async fn login_while_authenticated_skips_backend() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": jwt(42, 3600),
            "refreshToken": "r1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, None);
    let first = h.sessions.login("user@example.com", "secret123").await.unwrap();
    let second = h.sessions.login("other@example.com", "whatever").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn rejected_login_reports_backend_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid email or password"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, None);
    let err = h.sessions.login("user@example.com", "wrong").await.unwrap_err();

    match err {
        AuthError::InvalidCredentials(message) => assert_eq!(message, "Invalid email or password"),
        other => panic!("expected InvalidCredentials, got {:?}", other),
    }
    assert_eq!(h.sessions.state().await, AuthState::Anonymous);
    assert_eq!(h.storage.load().unwrap(), None);
}

#[tokio::test]
async fn login_validation_error_uses_first_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": [{ "msg": "Valid email is required" }, { "msg": "Password is required" }]
        })))
        .mount(&server)
        .await;

    let h = harness(&server, None);
    let err = h.sessions.login("nope", "").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials(ref m) if m == "Valid email is required"));
}

#[tokio::test]
async fn login_token_without_user_id_is_rejected() {
    let server = MockServer::start().await;
    // Header and payload without a userId claim
    let token = "eyJhbGciOiJIUzI1NiJ9.eyJleHAiOjQxMDI0NDQ4MDB9.sig";

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": token,
            "refreshToken": "r1"
        })))
        .mount(&server)
        .await;

    let h = harness(&server, None);
    let err = h.sessions.login("user@example.com", "secret123").await.unwrap_err();
    assert!(matches!(err, AuthError::TokenInvalid(_)));
    assert!(!h.sessions.is_authenticated().await);
    assert_eq!(h.storage.load().unwrap(), None);
}

#[tokio::test]
async fn expired_persisted_token_fails_validation_and_clears_storage() {
    let server = MockServer::start().await;
    let h = harness(&server, Some(credentials(&jwt(42, -60), Some("r1"))));

    // Derived from the persisted token before validation
    assert_eq!(h.sessions.state().await, AuthState::Authenticated);

    assert!(!h.sessions.validate_token().await);
    assert_eq!(h.sessions.state().await, AuthState::Anonymous);
    assert_eq!(h.storage.load().unwrap(), None);
}

#[tokio::test]
async fn logout_twice_matches_logout_once() {
    let server = MockServer::start().await;
    let h = harness(&server, Some(credentials(&jwt(42, 3600), Some("r1"))));
    let mut states = h.sessions.subscribe();

    h.sessions.logout().await;
    let after_one = h.sessions.session().await;
    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow_and_update(), AuthState::Anonymous);

    h.sessions.logout().await;
    assert_eq!(h.sessions.session().await, after_one);
    assert!(!after_one.is_authenticated);
    assert_eq!(after_one.user_id, None);
    assert_eq!(h.storage.load().unwrap(), None);
    // No second notification for the same state
    assert!(!states.has_changed().unwrap());
}

#[tokio::test]
async fn register_surfaces_validation_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": [{ "msg": "Password must be at least 8 characters" }]
        })))
        .mount(&server)
        .await;

    let err = auth_client(&server)
        .register(&finboard_core::api::RegisterRequest {
            email: "new@example.com".to_string(),
            password: "short".to_string(),
            name: Some("New User".to_string()),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Registration(ref m) if m == "Password must be at least 8 characters"));
}
