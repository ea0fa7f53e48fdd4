//! Local decoding of backend access tokens.
//!
//! The backend issues JWTs whose payload carries `userId` and `exp`. The
//! client only reads those claims to derive the user id and to detect
//! expiry without a round trip; the signature is never checked here; the
//! backend re-validates every request.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::AuthError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(rename = "userId", default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub iat: Option<i64>,
    pub exp: i64,
}

impl AccessClaims {
    /// `exp` is in Unix epoch seconds; a token whose `exp` equals `now` is still valid
    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        self.exp < now_secs
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// Seconds left before expiry, never negative
    pub fn seconds_until_expiry(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }
}

/// Decode the payload segment of a JWT without verifying its signature.
pub fn decode_access_token(token: &str) -> Result<AccessClaims, AuthError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::TokenInvalid(
            "expected three dot-separated segments".to_string(),
        ));
    };

    // Some issuers keep base64 padding on the segments
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::TokenInvalid(format!("payload is not base64url: {}", e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::TokenInvalid(format!("payload is not valid claims JSON: {}", e)))
}
