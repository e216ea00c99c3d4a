//! Application key derivation.

use crate::error::{CoreError, CoreResult};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// PBKDF2 iteration count.
pub const KDF_ROUNDS: u32 = 13_000;

/// Salt shared by every store.
///
/// A fixed salt keeps derivation deterministic, so the application
/// identity alone recovers the key.
pub const KDF_SALT: [u8; 8] = *b"chnvault";

/// Symmetric key derived from an application identity.
///
/// The key is zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AppKey {
    bytes: [u8; KEY_SIZE],
}

impl AppKey {
    /// Derives the key for an application identity with
    /// PBKDF2-HMAC-SHA256 over [`KDF_SALT`].
    ///
    /// The same identity always yields the same key.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity is empty.
    pub fn derive(app_id: &str) -> CoreResult<Self> {
        if app_id.is_empty() {
            return Err(CoreError::key_derivation_failed(
                "application identity is empty",
            ));
        }

        let mut bytes = [0u8; KEY_SIZE];
        pbkdf2::pbkdf2_hmac::<Sha256>(app_id.as_bytes(), &KDF_SALT, KDF_ROUNDS, &mut bytes);
        Ok(Self { bytes })
    }

    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CoreError::invalid_key_size(bytes.len(), KEY_SIZE));
        }

        let mut key_bytes = [0u8; KEY_SIZE];
        key_bytes.copy_from_slice(bytes);
        Ok(Self { bytes: key_bytes })
    }

    /// Returns the key bytes.
    ///
    /// # Security
    ///
    /// Never log or persist the result.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for AppKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
