//! Error types for channel-hosting operations.

use crate::types::{ChannelId, NamespaceId};
use std::io;
use thiserror::Error;

/// Result type for hosting operations.
pub type HostResult<T> = Result<T, HostError>;

/// Errors reported by a channel host.
#[derive(Debug, Error)]
pub enum HostError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The namespace does not exist or is not reachable.
    #[error("unknown namespace: {0}")]
    UnknownNamespace(NamespaceId),

    /// The channel does not exist (never created, or deleted externally).
    #[error("unknown channel: {0}")]
    UnknownChannel(ChannelId),

    /// The blob could not be fetched.
    #[error("blob fetch for {url} returned status {status}")]
    BlobStatus {
        /// The blob reference.
        url: String,
        /// Status reported by the host.
        status: u16,
    },

    /// A request exceeded a service limit.
    #[error("limit exceeded: {what} is {actual}, maximum {max}")]
    LimitExceeded {
        /// Which limit was hit.
        what: &'static str,
        /// Requested amount.
        actual: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// The host journal is corrupted.
    #[error("journal corrupted: {0}")]
    Corrupted(String),

    /// The host rejected the request for another reason.
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl HostError {
    /// Creates a limit-exceeded error.
    pub fn limit_exceeded(what: &'static str, actual: usize, max: usize) -> Self {
        Self::LimitExceeded { what, actual, max }
    }

    /// Creates a rejected-request error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// Returns true if the error says the channel is gone.
    #[must_use]
    pub fn is_missing_channel(&self) -> bool {
        matches!(self, Self::UnknownChannel(_))
    }
}
