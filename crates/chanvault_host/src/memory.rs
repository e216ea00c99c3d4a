//! In-memory channel host for testing.

use crate::error::{HostError, HostResult};
use crate::host::ChannelHost;
use crate::state::{HostEvent, HostState};
use crate::types::{
    Attachment, AuthorId, Blob, ChannelId, ChannelInfo, ChannelSpec, LogRecord, NamespaceId,
    RecordId,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// A host operation, used to target injected faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOp {
    /// [`ChannelHost::list_channels`].
    ListChannels,
    /// [`ChannelHost::channel`].
    Channel,
    /// [`ChannelHost::create_channel`].
    CreateChannel,
    /// [`ChannelHost::post_notice`].
    PostNotice,
    /// [`ChannelHost::append_record`].
    Append,
    /// [`ChannelHost::list_records`].
    ListRecords,
    /// [`ChannelHost::bulk_delete`].
    BulkDelete,
    /// [`ChannelHost::fetch_blob`].
    FetchBlob,
}

/// Call counters of an [`InMemoryHost`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    /// Number of `list_records` calls.
    pub list_calls: usize,
    /// Total records returned by `list_records`.
    pub records_listed: usize,
    /// Number of records appended, notices included.
    pub appends: usize,
    /// Number of `bulk_delete` calls that succeeded.
    pub bulk_deletes: usize,
    /// Number of channels created.
    pub channels_created: usize,
    /// Number of `channel` lookups.
    pub channel_lookups: usize,
    /// Number of `fetch_blob` calls.
    pub blob_fetches: usize,
}

#[derive(Debug, Default)]
struct Shared {
    state: RwLock<HostState>,
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    faults: Mutex<Vec<HostOp>>,
    blob_status: Mutex<Option<u16>>,
    stats: Mutex<HostStats>,
}

/// An in-memory channel host.
///
/// This host keeps every namespace, channel, record and blob in memory
/// and is suitable for:
/// - Unit and integration tests
/// - Benchmarks
/// - Ephemeral stores that don't need persistence
///
/// Several sessions with different author identities can share one
/// backing state through [`InMemoryHost::session`].
///
/// # Example
///
/// ```rust
/// use chanvault_host::{ChannelHost, InMemoryHost, NamespaceId};
///
/// let host = InMemoryHost::new("bot");
/// let ns = NamespaceId::new("guild");
/// host.add_namespace(&ns);
/// assert!(host.list_channels(&ns).unwrap().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryHost {
    shared: Arc<Shared>,
    author: AuthorId,
}

impl InMemoryHost {
    /// Creates an empty host whose session appends as `author`.
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            author: AuthorId::new(author),
        }
    }

    /// Opens another session on the same state under a different author.
    #[must_use]
    pub fn session(&self, author: impl Into<String>) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            author: AuthorId::new(author),
        }
    }

    /// Registers a namespace.
    pub fn add_namespace(&self, namespace: &NamespaceId) {
        self.shared.state.write().apply(&HostEvent::AddNamespace {
            namespace: namespace.clone(),
        });
    }

    /// Makes the next call of `op` fail.
    ///
    /// Calling this several times queues several failures.
    pub fn fail_next(&self, op: HostOp) {
        self.shared.faults.lock().push(op);
    }

    /// Makes every blob fetch report `status` until cleared with `None`.
    pub fn set_blob_status(&self, status: Option<u16>) {
        *self.shared.blob_status.lock() = status;
    }

    /// Deletes a channel as if someone removed it outside the store.
    pub fn remove_channel(&self, channel: ChannelId) {
        self.shared
            .state
            .write()
            .apply(&HostEvent::RemoveChannel { channel });
    }

    /// Returns every record of a channel, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel does not exist.
    pub fn records(&self, channel: ChannelId) -> HostResult<Vec<LogRecord>> {
        self.shared.state.read().records(channel)
    }

    /// Returns the creation parameters of a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel does not exist.
    pub fn channel_spec(&self, channel: ChannelId) -> HostResult<ChannelSpec> {
        self.shared.state.read().channel_spec(channel)
    }

    /// Returns the call counters.
    #[must_use]
    pub fn stats(&self) -> HostStats {
        *self.shared.stats.lock()
    }

    /// Resets the call counters.
    pub fn reset_stats(&self) {
        *self.shared.stats.lock() = HostStats::default();
    }

    fn check_fault(&self, op: HostOp) -> HostResult<()> {
        let mut faults = self.shared.faults.lock();
        if let Some(pos) = faults.iter().position(|f| *f == op) {
            faults.remove(pos);
            return Err(HostError::rejected(format!("injected failure for {op:?}")));
        }
        Ok(())
    }

    fn append(&self, channel: ChannelId, text: &str, blob: Option<Blob>) -> HostResult<RecordId> {
        HostState::check_text(text)?;

        let mut state = self.shared.state.write();
        state.channel(channel)?;
        let id = RecordId::new(state.allocate_id());

        let mut attachments = Vec::new();
        if let Some(blob) = blob {
            let url = format!("memory://blob/{}/{}", id.as_u64(), blob.name);
            self.shared.blobs.write().insert(url.clone(), blob.bytes);
            attachments.push(Attachment { url });
        }

        state.apply(&HostEvent::Append {
            channel,
            record: LogRecord {
                id,
                text: text.to_string(),
                author: self.author.clone(),
                attachments,
            },
        });
        self.shared.stats.lock().appends += 1;
        Ok(id)
    }
}

impl ChannelHost for InMemoryHost {
    fn identity(&self) -> AuthorId {
        self.author.clone()
    }

    fn list_channels(&self, namespace: &NamespaceId) -> HostResult<Vec<ChannelInfo>> {
        self.check_fault(HostOp::ListChannels)?;
        self.shared.state.read().list_channels(namespace)
    }

    fn channel(&self, channel: ChannelId) -> HostResult<ChannelInfo> {
        self.check_fault(HostOp::Channel)?;
        self.shared.stats.lock().channel_lookups += 1;
        self.shared.state.read().channel(channel)
    }

    fn create_channel(
        &self,
        namespace: &NamespaceId,
        spec: &ChannelSpec,
    ) -> HostResult<ChannelInfo> {
        self.check_fault(HostOp::CreateChannel)?;
        let mut state = self.shared.state.write();
        let (channel, event) = state.create_event(namespace, spec)?;
        state.apply(&event);

        self.shared.stats.lock().channels_created += 1;
        Ok(channel)
    }

    fn post_notice(&self, channel: ChannelId, text: &str) -> HostResult<()> {
        self.check_fault(HostOp::PostNotice)?;
        self.append(channel, text, None).map(|_| ())
    }

    fn append_record(
        &self,
        channel: ChannelId,
        text: &str,
        blob: Option<Blob>,
    ) -> HostResult<RecordId> {
        self.check_fault(HostOp::Append)?;
        self.append(channel, text, blob)
    }

    fn list_records(
        &self,
        channel: ChannelId,
        limit: usize,
        before: Option<RecordId>,
    ) -> HostResult<Vec<LogRecord>> {
        self.check_fault(HostOp::ListRecords)?;
        let page = self.shared.state.read().list_records(channel, limit, before)?;

        let mut stats = self.shared.stats.lock();
        stats.list_calls += 1;
        stats.records_listed += page.len();
        Ok(page)
    }

    fn bulk_delete(&self, channel: ChannelId, ids: &[RecordId]) -> HostResult<()> {
        self.check_fault(HostOp::BulkDelete)?;
        let mut state = self.shared.state.write();
        state.check_delete(channel, ids)?;

        let urls = state.attachment_urls(channel, ids);
        state.apply(&HostEvent::Delete {
            channel,
            ids: ids.to_vec(),
        });

        let mut blobs = self.shared.blobs.write();
        for url in urls {
            blobs.remove(&url);
        }
        self.shared.stats.lock().bulk_deletes += 1;
        Ok(())
    }

    fn fetch_blob(&self, url: &str) -> HostResult<Vec<u8>> {
        self.check_fault(HostOp::FetchBlob)?;
        self.shared.stats.lock().blob_fetches += 1;

        if let Some(status) = *self.shared.blob_status.lock() {
            return Err(HostError::BlobStatus {
                url: url.to_string(),
                status,
            });
        }

        self.shared
            .blobs
            .read()
            .get(url)
            .cloned()
            .ok_or_else(|| HostError::BlobStatus {
                url: url.to_string(),
                status: 404,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MAX_BULK_DELETE, MAX_PAGE_SIZE};
    use crate::types::AccessPolicy;

    fn setup() -> (InMemoryHost, ChannelId) {
        let host = InMemoryHost::new("bot");
        let ns = NamespaceId::new("guild");
        host.add_namespace(&ns);
        let info = host
            .create_channel(
                &ns,
                &ChannelSpec {
                    name: "kv".into(),
                    topic: "t".into(),
                    policy: AccessPolicy::owner_only(AuthorId::new("bot")),
                },
            )
            .unwrap();
        (host, info.id)
    }

    #[test]
    fn memory_unknown_namespace_fails() {
        let host = InMemoryHost::new("bot");
        let result = host.list_channels(&NamespaceId::new("nope"));
        assert!(matches!(result, Err(HostError::UnknownNamespace(_))));
    }

    #[test]
    fn memory_create_and_list_channel() {
        let (host, chan) = setup();
        let listed = host.list_channels(&NamespaceId::new("guild")).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, chan);
        assert_eq!(listed[0].name, "kv");
        assert_eq!(host.stats().channels_created, 1);
    }

    #[test]
    fn memory_append_ids_increase() {
        let (host, chan) = setup();
        let a = host.append_record(chan, "a", None).unwrap();
        let b = host.append_record(chan, "b", None).unwrap();
        assert!(b > a);
    }

    #[test]
    fn memory_append_records_author() {
        let (host, chan) = setup();
        let other = host.session("other");
        other.append_record(chan, "x", None).unwrap();
        host.append_record(chan, "y", None).unwrap();

        let page = host.list_records(chan, 10, None).unwrap();
        assert_eq!(page[0].author, AuthorId::new("bot"));
        assert_eq!(page[1].author, AuthorId::new("other"));
    }

    #[test]
    fn memory_blob_roundtrip() {
        let (host, chan) = setup();
        host.append_record(chan, "meta", Some(Blob::octet_stream("d", vec![9, 8, 7])))
            .unwrap();

        let page = host.list_records(chan, 1, None).unwrap();
        let url = &page[0].attachments[0].url;
        assert_eq!(host.fetch_blob(url).unwrap(), vec![9, 8, 7]);
    }

    #[test]
    fn memory_blob_status_override() {
        let (host, chan) = setup();
        host.append_record(chan, "meta", Some(Blob::octet_stream("d", vec![1])))
            .unwrap();
        let url = host.list_records(chan, 1, None).unwrap()[0].attachments[0]
            .url
            .clone();

        host.set_blob_status(Some(503));
        assert!(matches!(
            host.fetch_blob(&url),
            Err(HostError::BlobStatus { status: 503, .. })
        ));

        host.set_blob_status(None);
        assert!(host.fetch_blob(&url).is_ok());
    }

    #[test]
    fn memory_bulk_delete_removes_records_and_blobs() {
        let (host, chan) = setup();
        let keep = host.append_record(chan, "keep", None).unwrap();
        let gone = host
            .append_record(chan, "gone", Some(Blob::octet_stream("d", vec![1])))
            .unwrap();
        let url = host.list_records(chan, 1, None).unwrap()[0].attachments[0]
            .url
            .clone();

        host.bulk_delete(chan, &[gone, RecordId::new(9999)]).unwrap();

        let ids: Vec<_> = host.records(chan).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![keep]);
        assert!(host.fetch_blob(&url).is_err());
    }

    #[test]
    fn memory_limits_enforced() {
        let (host, chan) = setup();
        assert!(host.list_records(chan, MAX_PAGE_SIZE + 1, None).is_err());

        let ids: Vec<_> = (0..=MAX_BULK_DELETE as u64).map(RecordId::new).collect();
        assert!(matches!(
            host.bulk_delete(chan, &ids),
            Err(HostError::LimitExceeded { .. })
        ));
    }

    #[test]
    fn memory_injected_fault_fires_once() {
        let (host, chan) = setup();
        host.fail_next(HostOp::Append);

        assert!(host.append_record(chan, "a", None).is_err());
        assert!(host.append_record(chan, "a", None).is_ok());
    }

    #[test]
    fn memory_removed_channel_is_gone() {
        let (host, chan) = setup();
        host.remove_channel(chan);

        assert!(host.channel(chan).unwrap_err().is_missing_channel());
        assert!(host.append_record(chan, "a", None).is_err());
    }

    #[test]
    fn memory_stats_count_listed_records() {
        let (host, chan) = setup();
        for i in 0..5 {
            host.append_record(chan, &i.to_string(), None).unwrap();
        }
        host.reset_stats();

        host.list_records(chan, 3, None).unwrap();
        let stats = host.stats();
        assert_eq!(stats.list_calls, 1);
        assert_eq!(stats.records_listed, 3);
    }
}
