//! Namespace to channel resolution.
//!
//! Every namespace keeps its records in one channel with a reserved name.
//! The locator finds that channel, creates it on first use, and caches the
//! answer per namespace.
//!
//! ## Cache Invariants
//!
//! - One slot per namespace, each behind its own mutex
//! - A slot is locked for the whole of a resolve, so two first-time
//!   resolves of one namespace create at most one channel
//! - Different namespaces never wait on each other: the map lock is never
//!   held while a slot is locked
//! - A namespace whose resolve failed keeps no slot
//! - A cached ID is probed before use and evicted if the probe fails

use crate::error::{CoreError, CoreResult};
use chanvault_host::{AccessPolicy, ChannelHost, ChannelId, ChannelSpec, NamespaceId};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reserved name of a namespace's record channel.
pub const CHANNEL_NAME: &str = "chanvault_donotremove";

/// Topic set on a newly created channel.
pub const CHANNEL_TOPIC: &str =
    "This is an automated channel. Please allow bots to access it. Feel free to mute it.";

/// Notice posted once into a newly created channel.
pub const CHANNEL_NOTICE: &str = "This is an automated channel for bots to use for storing data.\n\
**Please ensure that bots are able to access this channel!**\n\
If the channel is deleted, you may lose bot data such as configurations.\n\n\
To avoid notifications from this channel, you may mute it and hide it from non-bot members.";

type Slot = Arc<Mutex<Option<ChannelId>>>;

/// Cache of resolved channel IDs, owned by one store.
#[derive(Debug, Default)]
pub struct ChannelLocator {
    slots: RwLock<HashMap<NamespaceId, Slot>>,
}

impl ChannelLocator {
    /// Creates an empty locator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, namespace: &NamespaceId) -> Slot {
        if let Some(slot) = self.existing_slot(namespace) {
            return slot;
        }
        Arc::clone(self.slots.write().entry(namespace.clone()).or_default())
    }

    /// Returns the slot of a namespace if one exists. The map guard is
    /// released before the caller locks the slot.
    fn existing_slot(&self, namespace: &NamespaceId) -> Option<Slot> {
        self.slots.read().get(namespace).cloned()
    }

    /// Returns the cached channel of a namespace without contacting the host.
    ///
    /// Blocks while a resolve of the same namespace is in flight.
    #[must_use]
    pub fn cached(&self, namespace: &NamespaceId) -> Option<ChannelId> {
        let slot = self.existing_slot(namespace)?;
        let id = *slot.lock();
        id
    }

    /// Forgets the cached channel of a namespace.
    pub fn evict(&self, namespace: &NamespaceId) {
        let Some(slot) = self.existing_slot(namespace) else {
            return;
        };
        if slot.lock().take().is_some() {
            debug!(%namespace, "evicted cached channel");
        }
    }

    /// Resolves the channel of a namespace, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NamespaceUnavailable`] if the namespace cannot
    /// be listed or the channel cannot be created.
    pub fn resolve<H: ChannelHost + ?Sized>(
        &self,
        host: &H,
        namespace: &NamespaceId,
    ) -> CoreResult<ChannelId> {
        let slot = self.slot(namespace);
        let result = resolve_slot(host, namespace, &slot);
        if result.is_err() {
            self.release(namespace, slot);
        }
        result
    }

    /// Drops the map entry of a namespace whose resolve failed, unless
    /// another caller holds the slot or it has a cached channel.
    fn release(&self, namespace: &NamespaceId, slot: Slot) {
        let mut slots = self.slots.write();
        let Some(current) = slots.get(namespace) else {
            return;
        };
        // New clones of a slot are only taken under the map lock, so the
        // count is stable while the write guard is held.
        if !Arc::ptr_eq(current, &slot) || Arc::strong_count(&slot) > 2 {
            return;
        }
        let empty = slot.try_lock().is_some_and(|cached| cached.is_none());
        if empty {
            slots.remove(namespace);
        }
    }
}

fn resolve_slot<H: ChannelHost + ?Sized>(
    host: &H,
    namespace: &NamespaceId,
    slot: &Slot,
) -> CoreResult<ChannelId> {
    let mut cached = slot.lock();

    if let Some(id) = *cached {
        match host.channel(id) {
            Ok(_) => {
                debug!(%namespace, channel = %id, "channel cache hit");
                return Ok(id);
            }
            Err(e) => {
                debug!(%namespace, channel = %id, error = %e, "cached channel is gone");
                *cached = None;
            }
        }
    }

    let existing = host
        .list_channels(namespace)
        .map_err(CoreError::NamespaceUnavailable)?
        .into_iter()
        .find(|c| c.name == CHANNEL_NAME);

    let id = match existing {
        Some(channel) => {
            debug!(%namespace, channel = %channel.id, "found channel");
            channel.id
        }
        None => create(host, namespace)?,
    };

    *cached = Some(id);
    Ok(id)
}

fn create<H: ChannelHost + ?Sized>(host: &H, namespace: &NamespaceId) -> CoreResult<ChannelId> {
    let spec = ChannelSpec {
        name: CHANNEL_NAME.to_string(),
        topic: CHANNEL_TOPIC.to_string(),
        policy: AccessPolicy::owner_only(host.identity()),
    };
    let channel = host
        .create_channel(namespace, &spec)
        .map_err(CoreError::NamespaceUnavailable)?;
    debug!(%namespace, channel = %channel.id, "created channel");

    if let Err(e) = host.post_notice(channel.id, CHANNEL_NOTICE) {
        warn!(%namespace, channel = %channel.id, error = %e, "failed to post channel notice");
    }
    Ok(channel.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chanvault_host::{
        AuthorId, Blob, ChannelInfo, HostOp, HostResult, InMemoryHost, LogRecord, RecordId,
    };
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    /// Blocks `list_channels` for one namespace until released.
    struct StallingHost {
        inner: InMemoryHost,
        stalled: NamespaceId,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl ChannelHost for StallingHost {
        fn identity(&self) -> AuthorId {
            self.inner.identity()
        }

        fn list_channels(&self, namespace: &NamespaceId) -> HostResult<Vec<ChannelInfo>> {
            if *namespace == self.stalled {
                self.entered.lock().send(()).unwrap();
                self.release.lock().recv().unwrap();
            }
            self.inner.list_channels(namespace)
        }

        fn channel(&self, channel: ChannelId) -> HostResult<ChannelInfo> {
            self.inner.channel(channel)
        }

        fn create_channel(
            &self,
            namespace: &NamespaceId,
            spec: &ChannelSpec,
        ) -> HostResult<ChannelInfo> {
            self.inner.create_channel(namespace, spec)
        }

        fn post_notice(&self, channel: ChannelId, text: &str) -> HostResult<()> {
            self.inner.post_notice(channel, text)
        }

        fn append_record(
            &self,
            channel: ChannelId,
            text: &str,
            blob: Option<Blob>,
        ) -> HostResult<RecordId> {
            self.inner.append_record(channel, text, blob)
        }

        fn list_records(
            &self,
            channel: ChannelId,
            limit: usize,
            before: Option<RecordId>,
        ) -> HostResult<Vec<LogRecord>> {
            self.inner.list_records(channel, limit, before)
        }

        fn bulk_delete(&self, channel: ChannelId, ids: &[RecordId]) -> HostResult<()> {
            self.inner.bulk_delete(channel, ids)
        }

        fn fetch_blob(&self, url: &str) -> HostResult<Vec<u8>> {
            self.inner.fetch_blob(url)
        }
    }

    fn host() -> (InMemoryHost, NamespaceId) {
        let host = InMemoryHost::new("bot");
        let ns = NamespaceId::new("guild");
        host.add_namespace(&ns);
        (host, ns)
    }

    #[test]
    fn creates_channel_once() {
        let (host, ns) = host();
        let locator = ChannelLocator::new();

        let a = locator.resolve(&host, &ns).unwrap();
        let b = locator.resolve(&host, &ns).unwrap();
        assert_eq!(a, b);
        assert_eq!(host.stats().channels_created, 1);
        assert_eq!(locator.cached(&ns), Some(a));
    }

    #[test]
    fn created_channel_is_locked_down() {
        let (host, ns) = host();
        let id = ChannelLocator::new().resolve(&host, &ns).unwrap();

        let spec = host.channel_spec(id).unwrap();
        assert_eq!(spec.name, CHANNEL_NAME);
        assert_eq!(spec.policy.grantee.as_str(), "bot");
        assert!(!spec.policy.members_may_write);

        let records = host.records(id).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, CHANNEL_NOTICE);
    }

    #[test]
    fn finds_existing_channel() {
        let (host, ns) = host();
        let first = ChannelLocator::new().resolve(&host, &ns).unwrap();

        // A fresh store finds it by name.
        let second = ChannelLocator::new().resolve(&host, &ns).unwrap();
        assert_eq!(first, second);
        assert_eq!(host.stats().channels_created, 1);
    }

    #[test]
    fn notice_failure_is_ignored() {
        let (host, ns) = host();
        host.fail_next(HostOp::PostNotice);

        let id = ChannelLocator::new().resolve(&host, &ns).unwrap();
        assert!(host.records(id).unwrap().is_empty());
    }

    #[test]
    fn stale_cache_entry_recreates() {
        let (host, ns) = host();
        let locator = ChannelLocator::new();
        let old = locator.resolve(&host, &ns).unwrap();

        host.remove_channel(old);
        let new = locator.resolve(&host, &ns).unwrap();
        assert_ne!(old, new);
        assert_eq!(host.stats().channels_created, 2);
    }

    #[test]
    fn namespace_failure_propagates() {
        let locator = ChannelLocator::new();
        let host = InMemoryHost::new("bot");
        let result = locator.resolve(&host, &NamespaceId::new("missing"));
        assert!(matches!(result, Err(CoreError::NamespaceUnavailable(_))));

        let (host, ns) = self::host();
        host.fail_next(HostOp::CreateChannel);
        assert!(matches!(
            locator.resolve(&host, &ns),
            Err(CoreError::NamespaceUnavailable(_))
        ));
        assert_eq!(locator.cached(&ns), None);
    }

    #[test]
    fn evict_clears_only_that_namespace() {
        let (host, ns) = host();
        let other = NamespaceId::new("other");
        host.add_namespace(&other);

        let locator = ChannelLocator::new();
        locator.resolve(&host, &ns).unwrap();
        locator.resolve(&host, &other).unwrap();

        locator.evict(&ns);
        assert_eq!(locator.cached(&ns), None);
        assert!(locator.cached(&other).is_some());
    }

    #[test]
    fn slow_namespace_does_not_block_others() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let (slow, fast) = (NamespaceId::new("slow"), NamespaceId::new("fast"));
        let inner = InMemoryHost::new("bot");
        inner.add_namespace(&slow);
        inner.add_namespace(&fast);
        let host = Arc::new(StallingHost {
            inner,
            stalled: slow.clone(),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        let locator = Arc::new(ChannelLocator::new());

        let resolving = {
            let (host, locator, slow) = (Arc::clone(&host), Arc::clone(&locator), slow.clone());
            thread::spawn(move || locator.resolve(&*host, &slow))
        };
        entered_rx.recv().unwrap();

        // Waits on the slow namespace's slot.
        let evicting = {
            let (locator, slow) = (Arc::clone(&locator), slow.clone());
            thread::spawn(move || locator.evict(&slow))
        };
        thread::sleep(Duration::from_millis(50));

        let (done_tx, done_rx) = mpsc::channel();
        let other = {
            let (host, locator) = (Arc::clone(&host), Arc::clone(&locator));
            thread::spawn(move || done_tx.send(locator.resolve(&*host, &fast)).unwrap())
        };
        let result = done_rx.recv_timeout(Duration::from_secs(5));

        release_tx.send(()).unwrap();
        resolving.join().unwrap().unwrap();
        evicting.join().unwrap();
        other.join().unwrap();

        assert!(result.expect("fast namespace waited on slow one").is_ok());
    }

    #[test]
    fn failed_resolve_leaves_no_slot() {
        let locator = ChannelLocator::new();
        let host = InMemoryHost::new("bot");
        for i in 0..10 {
            let ns = NamespaceId::new(format!("missing-{i}"));
            assert!(locator.resolve(&host, &ns).is_err());
        }
        assert!(locator.slots.read().is_empty());

        let (host, ns) = self::host();
        locator.resolve(&host, &ns).unwrap();
        host.remove_channel(locator.cached(&ns).unwrap());
        host.fail_next(HostOp::ListChannels);
        assert!(locator.resolve(&host, &ns).is_err());
        assert!(locator.slots.read().is_empty());

        locator.resolve(&host, &ns).unwrap();
        assert_eq!(locator.slots.read().len(), 1);
    }
}
