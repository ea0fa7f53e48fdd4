//! Unauthenticated auth endpoints: login, register, refresh.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::backend_message;
use crate::auth::AuthError;

/// Fallback message when the backend rejects a login without explanation
const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Client for the auth endpoints. These never carry a bearer token.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AuthError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Share an existing connection pool
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(StatusCode, Result<T, String>), AuthError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        let status = response.status();
        if status.is_success() {
            let parsed = response.json::<T>().await?;
            Ok((status, Ok(parsed)))
        } else {
            let body = response.text().await.unwrap_or_default();
            Ok((status, Err(body)))
        }
    }

    /// Exchange an email/password pair for a token pair
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, AuthError> {
        debug!(email = %request.email, "Sending login request");
        match self.post("auth/login", request).await? {
            (_, Ok(auth)) => Ok(auth),
            (status, Err(body)) if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED => {
                let message = backend_message(&body)
                    .unwrap_or_else(|| INVALID_CREDENTIALS_MESSAGE.to_string());
                warn!(status = status.as_u16(), "Login rejected");
                Err(AuthError::InvalidCredentials(message))
            }
            (status, Err(body)) => Err(AuthError::Server {
                status: status.as_u16(),
                body: backend_message(&body).unwrap_or(body),
            }),
        }
    }

    /// Create an account. The caller still has to log in afterwards.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, AuthError> {
        debug!(email = %request.email, "Sending registration request");
        match self.post("auth/register", request).await? {
            (_, Ok(auth)) => Ok(auth),
            (status, Err(body)) if status.is_client_error() => Err(AuthError::Registration(
                backend_message(&body).unwrap_or_else(|| "Registration failed".to_string()),
            )),
            (status, Err(body)) => Err(AuthError::Server {
                status: status.as_u16(),
                body: backend_message(&body).unwrap_or(body),
            }),
        }
    }

    /// Mint a new access token from a refresh token
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AuthError> {
        let request = RefreshRequest { refresh_token };
        match self.post("auth/refresh", &request).await {
            Ok((_, Ok(refreshed))) => Ok(refreshed),
            Ok((status, Err(body))) => Err(AuthError::RefreshFailed(format!(
                "status {}: {}",
                status.as_u16(),
                backend_message(&body).unwrap_or(body)
            ))),
            Err(e) => Err(AuthError::RefreshFailed(e.to_string())),
        }
    }
}
