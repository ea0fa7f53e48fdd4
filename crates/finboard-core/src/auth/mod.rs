//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionStore`: the ANONYMOUS / AUTHENTICATED state machine
//! - `TokenStore`: persistence of the access/refresh token pair
//! - `decode_access_token`: local JWT payload decoding (no verification)
//! - `SessionCipher`: passphrase sealing for the on-disk session file

pub mod crypto;
pub mod error;
pub mod keychain;
pub mod session;
pub mod store;
pub mod token;

pub use crypto::{SealedBlob, SessionCipher};
pub use error::AuthError;
pub use keychain::KeyringTokenStore;
pub use session::{AuthState, Session, SessionStore};
pub use store::{FileTokenStore, MemoryTokenStore, StoredCredentials, TokenStore};
pub use token::{decode_access_token, AccessClaims};
