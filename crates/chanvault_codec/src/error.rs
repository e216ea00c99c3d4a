//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while parsing record text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The text has fewer than the required fields.
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields {
        /// Minimum field count.
        expected: usize,
        /// Field count found.
        found: usize,
    },

    /// The location tag is neither `0` nor `1`.
    #[error("invalid data location tag: {tag:?}")]
    InvalidLocation {
        /// The tag found.
        tag: String,
    },

    /// A field is not valid hex.
    #[error("invalid hex in {field} field: {message}")]
    InvalidHex {
        /// Which field failed.
        field: &'static str,
        /// Description of the hex error.
        message: String,
    },
}

impl CodecError {
    /// Create a too-few-fields error.
    pub fn too_few_fields(expected: usize, found: usize) -> Self {
        Self::TooFewFields { expected, found }
    }

    /// Create an invalid location error.
    pub fn invalid_location(tag: impl Into<String>) -> Self {
        Self::InvalidLocation { tag: tag.into() }
    }

    /// Create an invalid hex error.
    pub fn invalid_hex(field: &'static str, err: hex::FromHexError) -> Self {
        Self::InvalidHex {
            field,
            message: err.to_string(),
        }
    }
}
