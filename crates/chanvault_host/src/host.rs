//! Channel host trait definition.

use crate::error::HostResult;
use crate::types::{AuthorId, Blob, ChannelId, ChannelInfo, ChannelSpec, LogRecord, NamespaceId, RecordId};

/// Maximum number of records returned by one page listing.
pub const MAX_PAGE_SIZE: usize = 100;
/// Maximum number of record IDs accepted by one bulk delete.
pub const MAX_BULK_DELETE: usize = 100;
/// Maximum length of a record's text field, in characters.
///
/// Wide enough for the longest inline record, whose text also carries
/// the nonce that the inline threshold does not count.
pub const MAX_RECORD_TEXT: usize = 4000;

/// A service hosting append-only channels.
///
/// Hosts are **opaque logs**. They store record text and blobs and list
/// them back in reverse creation order. They do not interpret record text.
///
/// # Invariants
///
/// - `append_record` returns an ID greater than every ID already in the channel
/// - `list_records` returns records newest first, strictly older than `before`
/// - Records are never modified after being appended
/// - Hosts must be `Send + Sync` for concurrent access
///
/// Every method is a blocking call. Timeouts and retries belong to the
/// implementation; a timed-out call is reported as an ordinary error.
pub trait ChannelHost: Send + Sync {
    /// Returns the author identity this session appends under.
    fn identity(&self) -> AuthorId;

    /// Lists the channels of a namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace is unknown or unreachable.
    fn list_channels(&self, namespace: &NamespaceId) -> HostResult<Vec<ChannelInfo>>;

    /// Looks up a single channel.
    ///
    /// Used as a cheap liveness probe.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel does not exist.
    fn channel(&self, channel: ChannelId) -> HostResult<ChannelInfo>;

    /// Creates a channel in a namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace is unknown or the host refuses.
    fn create_channel(&self, namespace: &NamespaceId, spec: &ChannelSpec)
        -> HostResult<ChannelInfo>;

    /// Posts a plain notice into a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel does not exist.
    fn post_notice(&self, channel: ChannelId, text: &str) -> HostResult<()>;

    /// Appends a record, optionally with an attached blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel does not exist or the text is too long.
    fn append_record(
        &self,
        channel: ChannelId,
        text: &str,
        blob: Option<Blob>,
    ) -> HostResult<RecordId>;

    /// Lists up to `limit` records older than `before`, newest first.
    ///
    /// With `before = None` the listing starts at the newest record. An
    /// empty result means the log is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel does not exist or `limit`
    /// exceeds [`MAX_PAGE_SIZE`].
    fn list_records(
        &self,
        channel: ChannelId,
        limit: usize,
        before: Option<RecordId>,
    ) -> HostResult<Vec<LogRecord>>;

    /// Deletes records by ID. Unknown IDs are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel does not exist or more than
    /// [`MAX_BULK_DELETE`] IDs are given.
    fn bulk_delete(&self, channel: ChannelId, ids: &[RecordId]) -> HostResult<()>;

    /// Fetches an attached blob by URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is missing or the fetch does not
    /// succeed.
    fn fetch_blob(&self, url: &str) -> HostResult<Vec<u8>>;
}

impl<H: ChannelHost + ?Sized> ChannelHost for std::sync::Arc<H> {
    fn identity(&self) -> AuthorId {
        (**self).identity()
    }

    fn list_channels(&self, namespace: &NamespaceId) -> HostResult<Vec<ChannelInfo>> {
        (**self).list_channels(namespace)
    }

    fn channel(&self, channel: ChannelId) -> HostResult<ChannelInfo> {
        (**self).channel(channel)
    }

    fn create_channel(
        &self,
        namespace: &NamespaceId,
        spec: &ChannelSpec,
    ) -> HostResult<ChannelInfo> {
        (**self).create_channel(namespace, spec)
    }

    fn post_notice(&self, channel: ChannelId, text: &str) -> HostResult<()> {
        (**self).post_notice(channel, text)
    }

    fn append_record(
        &self,
        channel: ChannelId,
        text: &str,
        blob: Option<Blob>,
    ) -> HostResult<RecordId> {
        (**self).append_record(channel, text, blob)
    }

    fn list_records(
        &self,
        channel: ChannelId,
        limit: usize,
        before: Option<RecordId>,
    ) -> HostResult<Vec<LogRecord>> {
        (**self).list_records(channel, limit, before)
    }

    fn bulk_delete(&self, channel: ChannelId, ids: &[RecordId]) -> HostResult<()> {
        (**self).bulk_delete(channel, ids)
    }

    fn fetch_blob(&self, url: &str) -> HostResult<Vec<u8>> {
        (**self).fetch_blob(url)
    }
}
