//! Session lifecycle: the ANONYMOUS / AUTHENTICATED state machine.
//!
//! `SessionStore` is the single owner of the credential pair. It is built
//! once at startup from persisted storage and shared (behind an `Arc`) with
//! the `ApiClient`, which asks it for the current bearer token and for a
//! refresh when the backend answers 401.

use std::fmt;

use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::store::{StoredCredentials, TokenStore};
use super::token::{decode_access_token, AccessClaims};
use super::AuthError;
use crate::api::{AuthClient, LoginRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

/// Snapshot of the current session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub is_authenticated: bool,
    pub user_id: Option<i64>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

// Tokens never reach log output
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("is_authenticated", &self.is_authenticated)
            .field("user_id", &self.user_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Session {
    fn anonymous() -> Self {
        Self {
            is_authenticated: false,
            user_id: None,
            access_token: None,
            refresh_token: None,
        }
    }

    fn from_credentials(credentials: &StoredCredentials) -> Self {
        Self {
            is_authenticated: true,
            user_id: credentials.user_id,
            access_token: Some(credentials.access_token.clone()),
            refresh_token: credentials.refresh_token.clone(),
        }
    }
}

pub struct SessionStore {
    auth: AuthClient,
    store: Box<dyn TokenStore>,
    /// `Some` exactly when the state is AUTHENTICATED
    credentials: RwLock<Option<StoredCredentials>>,
    /// Serializes refresh calls so concurrent 401s share one refresh
    refresh_guard: Mutex<()>,
    state_tx: watch::Sender<AuthState>,
}

impl SessionStore {
    /// Build the store from persisted credentials. A persisted access token
    /// means AUTHENTICATED; callers should follow up with `validate_token`.
    pub fn new(auth: AuthClient, store: Box<dyn TokenStore>) -> Self {
        let mut credentials = match store.load() {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!(error = %e, "Failed to load persisted session, starting anonymous");
                None
            }
        };

        if let Some(ref mut creds) = credentials {
            if creds.user_id.is_none() {
                creds.user_id = decode_access_token(&creds.access_token)
                    .ok()
                    .and_then(|claims| claims.user_id);
            }
        }

        let state = if credentials.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        };
        debug!(?state, "Session store initialized");

        let (state_tx, _) = watch::channel(state);

        Self {
            auth,
            store,
            credentials: RwLock::new(credentials),
            refresh_guard: Mutex::new(()),
            state_tx,
        }
    }

    /// Receive state transitions. A transition to `Anonymous` that the user
    /// did not ask for means the front end should send them to sign in.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    fn publish(&self, state: AuthState) {
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }

    pub async fn state(&self) -> AuthState {
        if self.credentials.read().await.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state().await == AuthState::Authenticated
    }

    pub async fn session(&self) -> Session {
        self.credentials
            .read()
            .await
            .as_ref()
            .map(Session::from_credentials)
            .unwrap_or_else(Session::anonymous)
    }

    pub async fn access_token(&self) -> Option<String> {
        self.credentials
            .read()
            .await
            .as_ref()
            .map(|c| c.access_token.clone())
    }

    pub async fn user_id(&self) -> Option<i64> {
        self.credentials.read().await.as_ref().and_then(|c| c.user_id)
    }

    /// Log in with an email/password pair.
    ///
    /// When a session is already active the backend is not contacted and the
    /// current session is returned unchanged.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if self.is_authenticated().await {
            debug!("Already authenticated, skipping login");
            return Ok(self.session().await);
        }

        info!(email = email, "Initiating login");
        let response = self
            .auth
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        let claims = decode_access_token(&response.access_token)?;
        let user_id = claims
            .user_id
            .ok_or_else(|| AuthError::TokenInvalid("User ID not found in token".to_string()))?;

        let credentials = StoredCredentials {
            access_token: response.access_token,
            refresh_token: Some(response.refresh_token),
            user_id: Some(user_id),
        };

        let mut guard = self.credentials.write().await;
        self.store.save(&credentials)?;
        let session = Session::from_credentials(&credentials);
        *guard = Some(credentials);
        drop(guard);

        self.publish(AuthState::Authenticated);
        info!(user_id, "Login successful");
        Ok(session)
    }

    /// Clear all persisted credentials and drop to ANONYMOUS. Always succeeds.
    pub async fn logout(&self) {
        let mut guard = self.credentials.write().await;
        if guard.take().is_some() {
            info!("Executing logout");
        }
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear persisted session");
        }
        drop(guard);

        self.publish(AuthState::Anonymous);
    }

    /// Check the current access token locally.
    ///
    /// Returns the decoded claims, `TokenExpired`, or `TokenInvalid`. Does not
    /// change state; see `validate_token`.
    pub async fn check_token(&self) -> Result<AccessClaims, AuthError> {
        let token = self
            .access_token()
            .await
            .ok_or_else(|| AuthError::TokenInvalid("no access token".to_string()))?;
        let claims = decode_access_token(&token)?;
        if claims.is_expired() {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    /// Validate the current access token without a network round trip.
    /// An expired or undecodable token logs the session out.
    pub async fn validate_token(&self) -> bool {
        if self.access_token().await.is_none() {
            self.publish(AuthState::Anonymous);
            return false;
        }

        match self.check_token().await {
            Ok(claims) => {
                if let Some(user_id) = claims.user_id {
                    if let Some(ref mut creds) = *self.credentials.write().await {
                        creds.user_id = Some(user_id);
                    }
                }
                self.publish(AuthState::Authenticated);
                debug!(expires_in = claims.seconds_until_expiry(), "Access token valid");
                true
            }
            Err(AuthError::TokenExpired) => {
                info!("Token expired, logging out");
                self.logout().await;
                false
            }
            Err(e) => {
                warn!(error = %e, "Invalid token, logging out");
                self.logout().await;
                false
            }
        }
    }

    /// Replace the access token after the backend rejected `rejected_token`.
    ///
    /// Only one refresh runs at a time. A caller that waited behind another
    /// refresh gets the already-replaced token back without a second call.
    /// Any failure ends the session.
    pub async fn refresh_access_token(
        &self,
        rejected_token: Option<&str>,
    ) -> Result<String, AuthError> {
        let _refreshing = self.refresh_guard.lock().await;

        let current = self.credentials.read().await.clone();

        if let Some(ref creds) = current {
            if rejected_token != Some(creds.access_token.as_str()) {
                debug!("Access token already replaced, reusing it");
                return Ok(creds.access_token.clone());
            }
        }

        let Some(refresh_token) = current.and_then(|c| c.refresh_token) else {
            warn!("No refresh token available, logging out");
            self.logout().await;
            return Err(AuthError::MissingRefreshToken);
        };

        let refreshed = match self.auth.refresh(&refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                error!(error = %e, "Token refresh failed");
                self.logout().await;
                return Err(match e {
                    AuthError::RefreshFailed(_) => e,
                    other => AuthError::RefreshFailed(other.to_string()),
                });
            }
        };

        let mut guard = self.credentials.write().await;
        let creds = match guard.as_mut() {
            Some(creds) if creds.refresh_token.as_deref() == Some(refresh_token.as_str()) => creds,
            // Logged in again while the refresh was in flight: the new session wins
            Some(creds) => {
                debug!("Session replaced during refresh, discarding refreshed token");
                return Ok(creds.access_token.clone());
            }
            None => {
                debug!("Session ended during refresh, discarding refreshed token");
                return Err(AuthError::RefreshFailed(
                    "session ended during refresh".to_string(),
                ));
            }
        };

        creds.access_token = refreshed.access_token.clone();
        if let Some(user_id) = decode_access_token(&refreshed.access_token)
            .ok()
            .and_then(|claims| claims.user_id)
        {
            creds.user_id = Some(user_id);
        }
        if let Err(e) = self.store.save(creds) {
            warn!(error = %e, "Failed to persist refreshed access token");
        }
        drop(guard);

        info!("Access token refreshed");
        Ok(refreshed.access_token)
    }
}
