#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use finboard_core::api::{ApiClient, AuthClient};
use finboard_core::auth::{MemoryTokenStore, SessionStore, StoredCredentials};
use wiremock::MockServer;

/// Unsigned JWT carrying `userId` and an `exp` relative to now
pub fn jwt(user_id: i64, expires_in_secs: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = serde_json::json!({
        "userId": user_id,
        "email": "user@example.com",
        "iat": Utc::now().timestamp(),
        "exp": Utc::now().timestamp() + expires_in_secs,
    });
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.signature", header, body)
}

pub fn api_base(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

pub fn auth_client(server: &MockServer) -> AuthClient {
    AuthClient::new(&api_base(server), Duration::from_secs(5)).unwrap()
}

/// Base URL of a port nothing listens on
pub fn unreachable_base() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/api", port)
}

pub struct Harness {
    pub storage: Arc<MemoryTokenStore>,
    pub sessions: Arc<SessionStore>,
    pub api: ApiClient,
}

/// Session store and API client against `server`, optionally pre-seeded
/// with persisted credentials
pub fn harness(server: &MockServer, persisted: Option<StoredCredentials>) -> Harness {
    harness_at(&api_base(server), persisted)
}

pub fn harness_at(base: &str, persisted: Option<StoredCredentials>) -> Harness {
    let storage = Arc::new(match persisted {
        Some(credentials) => MemoryTokenStore::with_credentials(credentials),
        None => MemoryTokenStore::new(),
    });
    let sessions = Arc::new(SessionStore::new(
        AuthClient::new(base, Duration::from_secs(5)).unwrap(),
        Box::new(Arc::clone(&storage)),
    ));
    let api = ApiClient::new(base, Duration::from_secs(5), Arc::clone(&sessions)).unwrap();

    Harness {
        storage,
        sessions,
        api,
    }
}

pub fn credentials(access_token: &str, refresh_token: Option<&str>) -> StoredCredentials {
    StoredCredentials {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.map(str::to_string),
        user_id: Some(42),
    }
}
