use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::crypto::{SealedBlob, SessionCipher};

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// The state that must survive a restart: the token pair and the derived user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user_id: Option<i64>,
}

/// Persistent key/value backing for the credential pair.
pub trait TokenStore: Send + Sync {
    /// Load persisted credentials, `None` when nothing is stored
    fn load(&self) -> Result<Option<StoredCredentials>>;

    fn save(&self, credentials: &StoredCredentials) -> Result<()>;

    /// Remove persisted credentials. Clearing an empty store succeeds.
    fn clear(&self) -> Result<()>;
}

// Lets a caller keep a handle on the store it hands to a `SessionStore`
impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    fn load(&self) -> Result<Option<StoredCredentials>> {
        (**self).load()
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<()> {
        (**self).save(credentials)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    credentials: Mutex<Option<StoredCredentials>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: StoredCredentials) -> Self {
        Self {
            credentials: Mutex::new(Some(credentials)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<StoredCredentials>> {
        let guard = self
            .credentials
            .lock()
            .map_err(|_| anyhow!("Token store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<()> {
        let mut guard = self
            .credentials
            .lock()
            .map_err(|_| anyhow!("Token store lock poisoned"))?;
        *guard = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .credentials
            .lock()
            .map_err(|_| anyhow!("Token store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

/// JSON file in the cache directory, optionally sealed with a passphrase.
pub struct FileTokenStore {
    cache_dir: PathBuf,
    passphrase: Option<String>,
}

impl FileTokenStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            passphrase: None,
        }
    }

    /// Seal the session file with a key derived from `passphrase`
    pub fn with_passphrase(cache_dir: PathBuf, passphrase: String) -> Self {
        Self {
            cache_dir,
            passphrase: Some(passphrase),
        }
    }

    pub fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredCredentials>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;

        let credentials = match self.passphrase {
            Some(ref passphrase) => {
                let blob: SealedBlob =
                    serde_json::from_str(&contents).context("Failed to parse sealed session file")?;
                let plaintext = SessionCipher::open(passphrase, &blob)?;
                serde_json::from_slice(&plaintext).context("Failed to parse session data")?
            }
            None => serde_json::from_str(&contents).context("Failed to parse session file")?,
        };

        debug!(path = %path.display(), "Session file loaded");
        Ok(Some(credentials))
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = match self.passphrase {
            Some(ref passphrase) => {
                let plaintext = serde_json::to_vec(credentials)?;
                let blob = SessionCipher::with_random_salt(passphrase)?.seal(&plaintext)?;
                serde_json::to_string_pretty(&blob)?
            }
            None => serde_json::to_string_pretty(credentials)?,
        };

        std::fs::write(&path, contents).context("Failed to write session file")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}
