//! Authenticated encryption with AES-256-GCM.

use super::key::AppKey;
use crate::error::{CoreError, CoreResult};
use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;

/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// A sealed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// Nonce used for this encryption.
    pub nonce: [u8; NONCE_SIZE],
    /// Ciphertext followed by the tag.
    pub ciphertext: Vec<u8>,
}

/// AES-256-GCM cipher bound to one key.
///
/// Stateless after construction and safe to share between threads.
pub struct Cipher {
    cipher: Aes256Gcm,
}

impl Cipher {
    /// Creates a cipher for the given key.
    #[must_use]
    pub fn new(key: &AppKey) -> Self {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));
        Self { cipher }
    }

    /// Seals `plaintext` under a fresh nonce from the OS RNG.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS RNG fails or sealing fails.
    pub fn encrypt(&self, plaintext: &[u8]) -> CoreResult<Sealed> {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|e| CoreError::encryption_failed(format!("nonce generation: {e}")))?;

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| CoreError::encryption_failed("encryption error"))?;

        Ok(Sealed { nonce, ciphertext })
    }

    /// Opens a sealed value.
    ///
    /// # Errors
    ///
    /// Returns an error if the nonce has the wrong size or the ciphertext
    /// does not authenticate under this key.
    pub fn decrypt(&self, nonce: &[u8], ciphertext: &[u8]) -> CoreResult<Vec<u8>> {
        if nonce.len() != NONCE_SIZE {
            return Err(CoreError::decryption_failed(format!(
                "nonce is {} bytes, expected {NONCE_SIZE}",
                nonce.len()
            )));
        }
        if ciphertext.len() < TAG_SIZE {
            return Err(CoreError::decryption_failed("ciphertext too short"));
        }

        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CoreError::decryption_failed("authentication failed"))
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher")
            .field("cipher", &"Aes256Gcm")
            .finish()
    }
}
