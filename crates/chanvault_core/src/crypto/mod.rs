//! Cryptography for chanvault.
//!
//! ## Security Model
//!
//! - Keys come from PBKDF2-HMAC-SHA256 over the application identity
//! - Values are sealed with AES-256-GCM under a fresh random nonce
//! - Keys are stored as SHA-256 content addresses, never in clear
//! - Key material is zeroized on drop
//!
//! ## Usage
//!
//! ```
//! use chanvault_core::crypto::CryptoManager;
//!
//! let crypto = CryptoManager::new("my-bot").unwrap();
//! let sealed = crypto.encrypt(b"value").unwrap();
//! let opened = crypto.decrypt(&sealed.nonce, &sealed.ciphertext).unwrap();
//! assert_eq!(opened, b"value");
//! assert_eq!(crypto.hash_key("k").len(), 64);
//! ```

mod cipher;
mod hash;
mod key;

pub use cipher::{Cipher, Sealed, NONCE_SIZE, TAG_SIZE};
pub use hash::{hash_key, KEY_HASH_LEN};
pub use key::{AppKey, KDF_ROUNDS, KDF_SALT, KEY_SIZE};

use crate::error::CoreResult;

/// Key hashing and value encryption for one application identity.
#[derive(Debug)]
pub struct CryptoManager {
    app_id: String,
    cipher: Cipher,
}

impl CryptoManager {
    /// Derives the key for `app_id` and builds the cipher.
    ///
    /// # Errors
    ///
    /// Returns an error if key derivation fails.
    pub fn new(app_id: &str) -> CoreResult<Self> {
        let key = AppKey::derive(app_id)?;
        Ok(Self::with_key(app_id, &key))
    }

    /// Builds a manager from an existing key.
    #[must_use]
    pub fn with_key(app_id: &str, key: &AppKey) -> Self {
        Self {
            app_id: app_id.to_string(),
            cipher: Cipher::new(key),
        }
    }

    /// Returns the application identity.
    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Returns the content address of `key`.
    #[must_use]
    pub fn hash_key(&self, key: &str) -> String {
        hash_key(key, &self.app_id)
    }

    /// Seals a value.
    ///
    /// # Errors
    ///
    /// See [`Cipher::encrypt`].
    pub fn encrypt(&self, plaintext: &[u8]) -> CoreResult<Sealed> {
        self.cipher.encrypt(plaintext)
    }

    /// Opens a value.
    ///
    /// # Errors
    ///
    /// See [`Cipher::decrypt`].
    pub fn decrypt(&self, nonce: &[u8], ciphertext: &[u8]) -> CoreResult<Vec<u8>> {
        self.cipher.decrypt(nonce, ciphertext)
    }
}
