use anyhow::{Context, Result};
use keyring::Entry;

use super::store::{StoredCredentials, TokenStore};

const SERVICE_NAME: &str = "finboard";

/// Keychain account the credential pair is stored under
const DEFAULT_ACCOUNT: &str = "session";

/// Stores the credential pair in the OS keychain as a JSON secret.
pub struct KeyringTokenStore {
    account: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self {
            account: DEFAULT_ACCOUNT.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &self.account).context("Failed to create keyring entry")
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<StoredCredentials>> {
        match self.entry()?.get_password() {
            Ok(secret) => {
                let credentials = serde_json::from_str(&secret)
                    .context("Failed to parse session stored in keychain")?;
                Ok(Some(credentials))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve session from keychain"),
        }
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<()> {
        let secret = serde_json::to_string(credentials)?;
        self.entry()?
            .set_password(&secret)
            .context("Failed to store session in keychain")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete session from keychain"),
        }
    }
}
