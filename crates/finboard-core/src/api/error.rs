use serde::Deserialize;
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized - session is no longer valid")]
    Unauthorized,

    /// 401 on a request already retried with a freshly refreshed token.
    /// The session is kept.
    #[error("Request rejected after token refresh")]
    RejectedAfterRefresh,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Session error: {0}")]
    Session(#[from] AuthError),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Debug, Deserialize)]
struct ValidationError {
    msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ValidationError>,
    message: Option<String>,
}

/// Pull the user-facing message out of a backend error body.
/// Validation failures come as `{"errors":[{"msg":..}]}`, other failures as `{"message":..}`.
pub fn backend_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .errors
        .into_iter()
        .find_map(|e| e.msg)
        .or(parsed.message)
        .filter(|m| !m.is_empty())
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = backend_message(body).unwrap_or_else(|| Self::truncate_body(body));
        match status.as_u16() {
            400 | 422 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }

    /// Whether the session was torn down while handling this error.
    /// Agrees with `SessionStore::state()` after the failed request.
    pub fn is_session_lost(&self) -> bool {
        match self {
            ApiError::Unauthorized => true,
            ApiError::Session(e) => e.ends_session(),
            _ => false,
        }
    }

    /// Find an `ApiError` anywhere in an operation-level error chain
    pub fn find(err: &anyhow::Error) -> Option<&ApiError> {
        err.downcast_ref::<ApiError>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_backend_message_prefers_validation_errors() {
        let body = r#"{"errors":[{"msg":"Valid email is required"}],"message":"Bad"}"#;
        assert_eq!(backend_message(body).as_deref(), Some("Valid email is required"));

        assert_eq!(
            backend_message(r#"{"message":"Transaction not found"}"#).as_deref(),
            Some("Transaction not found")
        );
        assert_eq!(backend_message("<html>oops</html>"), None);
        assert_eq!(backend_message(r#"{"errors":[]}"#), None);
    }

    #[test]
    fn test_from_status_maps_codes() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, r#"{"message":"gone"}"#),
            ApiError::NotFound(ref m) if m == "gone"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "upstream"),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, ""),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_rejection_after_refresh_keeps_session() {
        assert!(!ApiError::RejectedAfterRefresh.is_session_lost());
        assert!(ApiError::Unauthorized.is_session_lost());
        assert!(ApiError::Session(AuthError::RefreshFailed("revoked".to_string())).is_session_lost());
        assert!(!ApiError::ServerError("boom".to_string()).is_session_lost());
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "é".repeat(400);
        match ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body) {
            ApiError::ServerError(m) => assert!(m.contains("truncated, 800 total bytes")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
