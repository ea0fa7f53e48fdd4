//! Passphrase sealing for the persisted session file.
//!
//! Keys are derived with Argon2id from a user passphrase and a random salt;
//! the payload is sealed with ChaCha20-Poly1305 under a fresh nonce.

use anyhow::{anyhow, Context, Result};
use argon2::Argon2;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Current on-disk format version
const SEALED_VERSION: u32 = 1;

const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Sealed payload as written to disk. Binary fields are base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedBlob {
    pub version: u32,
    pub salt: String,
    pub nonce: String,
    pub ciphertext: String,
}

pub struct SessionCipher {
    cipher: ChaCha20Poly1305,
    salt: [u8; SALT_LEN],
}

impl SessionCipher {
    /// Derive a cipher from a passphrase and salt
    pub fn derive(passphrase: &str, salt: &[u8]) -> Result<Self> {
        let salt: [u8; SALT_LEN] = salt
            .try_into()
            .map_err(|_| anyhow!("Salt must be {} bytes", SALT_LEN))?;

        let mut key = [0u8; KEY_LEN];
        Argon2::default()
            .hash_password_into(passphrase.as_bytes(), &salt, &mut key)
            .map_err(|e| anyhow!("Failed to derive session key: {}", e))?;

        Ok(Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(&key)),
            salt,
        })
    }

    /// Derive a cipher with a freshly generated random salt
    pub fn with_random_salt(passphrase: &str) -> Result<Self> {
        let mut salt = [0u8; SALT_LEN];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        Self::derive(passphrase, &salt)
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<SealedBlob> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| anyhow!("Failed to seal session data"))?;

        Ok(SealedBlob {
            version: SEALED_VERSION,
            salt: STANDARD.encode(self.salt),
            nonce: STANDARD.encode(nonce),
            ciphertext: STANDARD.encode(ciphertext),
        })
    }

    /// Open a blob sealed with the same passphrase. Fails on a wrong
    /// passphrase or any modification of the blob.
    pub fn open(passphrase: &str, blob: &SealedBlob) -> Result<Vec<u8>> {
        if blob.version != SEALED_VERSION {
            return Err(anyhow!("Unsupported session file version {}", blob.version));
        }

        let salt = STANDARD.decode(&blob.salt).context("Invalid salt encoding")?;
        let nonce = STANDARD.decode(&blob.nonce).context("Invalid nonce encoding")?;
        let ciphertext = STANDARD
            .decode(&blob.ciphertext)
            .context("Invalid ciphertext encoding")?;

        if nonce.len() != NONCE_LEN {
            return Err(anyhow!("Nonce must be {} bytes", NONCE_LEN));
        }

        let cipher = Self::derive(passphrase, &salt)?;
        cipher
            .cipher
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
            .map_err(|_| anyhow!("Failed to open session data - wrong passphrase or corrupted file"))
    }
}
