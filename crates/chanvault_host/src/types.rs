//! Identifier and record types shared by hosts and the store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a tenant namespace (a "guild").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NamespaceId(pub String);

impl NamespaceId {
    /// Creates a namespace ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw ID.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns:{}", self.0)
    }
}

/// Identity under which records are appended.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorId(pub String);

impl AuthorId {
    /// Creates an author ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw ID.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl ChannelId {
    /// Creates a channel ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chan:{}", self.0)
    }
}

/// Identifier of a record within a channel.
///
/// Record IDs grow with creation order, so a larger ID is a newer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Creates a record ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rec:{}", self.0)
    }
}

/// A channel as listed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel ID.
    pub id: ChannelId,
    /// Channel name.
    pub name: String,
}

/// Write access granted on a newly created channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    /// The identity granted full text access.
    pub grantee: AuthorId,
    /// Whether ordinary namespace members may post into the channel.
    pub members_may_write: bool,
}

impl AccessPolicy {
    /// Least-privilege policy: only `grantee` writes.
    #[must_use]
    pub fn owner_only(grantee: AuthorId) -> Self {
        Self {
            grantee,
            members_may_write: false,
        }
    }
}

/// Parameters for creating a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Channel name.
    pub name: String,
    /// Channel topic shown to members.
    pub topic: String,
    /// Access policy.
    pub policy: AccessPolicy,
}

/// A blob attached to an appended record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// File name of the blob.
    pub name: String,
    /// MIME content type.
    pub content_type: String,
    /// Blob contents.
    pub bytes: Vec<u8>,
}

impl Blob {
    /// Creates an `application/octet-stream` blob.
    pub fn octet_stream(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: "application/octet-stream".to_string(),
            bytes,
        }
    }
}

/// Reference to a blob attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Location the blob can be fetched from.
    pub url: String,
}

/// A record as returned by a page listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Record ID.
    pub id: RecordId,
    /// Text field.
    pub text: String,
    /// Author identity.
    pub author: AuthorId,
    /// Attached blobs.
    pub attachments: Vec<Attachment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_ids_order_by_creation() {
        assert!(RecordId::new(10) > RecordId::new(9));
        assert_eq!(RecordId::new(7).as_u64(), 7);
    }

    #[test]
    fn display_formats() {
        assert_eq!(NamespaceId::new("guild").to_string(), "ns:guild");
        assert_eq!(ChannelId::new(4).to_string(), "chan:4");
        assert_eq!(RecordId::new(12).to_string(), "rec:12");
        assert_eq!(AuthorId::new("bot").to_string(), "bot");
    }

    #[test]
    fn owner_only_policy() {
        let policy = AccessPolicy::owner_only(AuthorId::new("bot"));
        assert_eq!(policy.grantee.as_str(), "bot");
        assert!(!policy.members_may_write);
    }

    #[test]
    fn octet_stream_blob() {
        let blob = Blob::octet_stream("d", vec![1, 2]);
        assert_eq!(blob.content_type, "application/octet-stream");
    }
}
