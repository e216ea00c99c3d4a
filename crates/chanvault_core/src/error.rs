//! Error types for chanvault core.

use chanvault_codec::CodecError;
use chanvault_host::HostError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The key is empty.
    #[error("empty keys are not permitted")]
    EmptyKey,

    /// No record exists for the key.
    #[error("pair does not exist")]
    NotFound,

    /// The namespace's channel could not be listed or created.
    #[error("namespace unavailable: {0}")]
    NamespaceUnavailable(#[source] HostError),

    /// The matching record could not be decoded.
    #[error("malformed record: {message}")]
    MalformedRecord {
        /// Description of the problem.
        message: String,
        /// Codec error, when the text failed to parse.
        #[source]
        source: Option<CodecError>,
    },

    /// Encryption failed.
    #[error("encryption failed: {message}")]
    EncryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// Decryption or authentication failed.
    #[error("decryption failed: {message}")]
    DecryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// The out-of-band blob could not be fetched.
    #[error("blob fetch failed: {0}")]
    BlobFetch(#[source] HostError),

    /// A bulk delete call failed. Earlier batches may already be gone.
    #[error("bulk delete failed: {0}")]
    BulkDelete(#[source] HostError),

    /// Appending the record failed.
    #[error("append failed: {0}")]
    Append(#[source] HostError),

    /// Listing a page of records failed.
    #[error("scan failed: {0}")]
    Scan(#[source] HostError),

    /// Invalid key size.
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Expected size in bytes.
        expected: usize,
        /// Actual size in bytes.
        actual: usize,
    },

    /// Key derivation failed.
    #[error("key derivation failed: {message}")]
    KeyDerivationFailed {
        /// Description of the failure.
        message: String,
    },

    /// An option name is not recognized.
    #[error("unknown option: {name}")]
    UnknownOption {
        /// The rejected name.
        name: String,
    },
}

/// The kind of a [`CoreError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`CoreError::EmptyKey`].
    EmptyKey,
    /// See [`CoreError::NotFound`].
    NotFound,
    /// See [`CoreError::NamespaceUnavailable`].
    NamespaceUnavailable,
    /// See [`CoreError::MalformedRecord`].
    MalformedRecord,
    /// See [`CoreError::EncryptionFailed`].
    EncryptionFailed,
    /// See [`CoreError::DecryptionFailed`].
    DecryptionFailed,
    /// See [`CoreError::BlobFetch`].
    BlobFetch,
    /// See [`CoreError::BulkDelete`].
    BulkDelete,
    /// See [`CoreError::Append`].
    Append,
    /// See [`CoreError::Scan`].
    Scan,
    /// See [`CoreError::InvalidKeySize`].
    InvalidKeySize,
    /// See [`CoreError::KeyDerivationFailed`].
    KeyDerivationFailed,
    /// See [`CoreError::UnknownOption`].
    UnknownOption,
}

impl CoreError {
    /// Creates a malformed record error.
    pub fn malformed_record(message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an encryption failed error.
    pub fn encryption_failed(message: impl Into<String>) -> Self {
        Self::EncryptionFailed {
            message: message.into(),
        }
    }

    /// Creates a decryption failed error.
    pub fn decryption_failed(message: impl Into<String>) -> Self {
        Self::DecryptionFailed {
            message: message.into(),
        }
    }

    /// Creates an invalid key size error.
    pub fn invalid_key_size(actual: usize, expected: usize) -> Self {
        Self::InvalidKeySize { expected, actual }
    }

    /// Creates a key derivation failed error.
    pub fn key_derivation_failed(message: impl Into<String>) -> Self {
        Self::KeyDerivationFailed {
            message: message.into(),
        }
    }

    /// Creates an unknown option error.
    pub fn unknown_option(name: impl Into<String>) -> Self {
        Self::UnknownOption { name: name.into() }
    }

    /// Returns true for [`CoreError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Returns the error kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyKey => ErrorKind::EmptyKey,
            Self::NotFound => ErrorKind::NotFound,
            Self::NamespaceUnavailable(_) => ErrorKind::NamespaceUnavailable,
            Self::MalformedRecord { .. } => ErrorKind::MalformedRecord,
            Self::EncryptionFailed { .. } => ErrorKind::EncryptionFailed,
            Self::DecryptionFailed { .. } => ErrorKind::DecryptionFailed,
            Self::BlobFetch(_) => ErrorKind::BlobFetch,
            Self::BulkDelete(_) => ErrorKind::BulkDelete,
            Self::Append(_) => ErrorKind::Append,
            Self::Scan(_) => ErrorKind::Scan,
            Self::InvalidKeySize { .. } => ErrorKind::InvalidKeySize,
            Self::KeyDerivationFailed { .. } => ErrorKind::KeyDerivationFailed,
            Self::UnknownOption { .. } => ErrorKind::UnknownOption,
        }
    }
}

impl From<CodecError> for CoreError {
    fn from(err: CodecError) -> Self {
        Self::MalformedRecord {
            message: err.to_string(),
            source: Some(err),
        }
    }
}
