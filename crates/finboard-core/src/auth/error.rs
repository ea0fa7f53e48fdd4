use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("Registration failed: {0}")]
    Registration(String),

    #[error("Access token expired")]
    TokenExpired,

    #[error("Invalid access token: {0}")]
    TokenInvalid(String),

    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error("Failed to refresh token: {0}")]
    RefreshFailed(String),

    #[error("Unexpected response from auth server (status {status}): {body}")]
    Server { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl AuthError {
    /// Whether this error tore down (or should tear down) the session
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            AuthError::TokenExpired
                | AuthError::TokenInvalid(_)
                | AuthError::MissingRefreshToken
                | AuthError::RefreshFailed(_)
        )
    }
}
