//! The key-value store.

use crate::compaction::{compact, delete_chunked, CompactionStats};
use crate::config::Config;
use crate::crypto::{CryptoManager, KEY_HASH_LEN};
use crate::error::{CoreError, CoreResult};
use crate::locator::ChannelLocator;
use crate::scan::{scan, Filter, ScanLimits};
use chanvault_codec::{parse_record, serialize_record, DataLocation, EncodedRecord};
use chanvault_host::{AuthorId, Blob, ChannelHost, ChannelId, LogRecord, NamespaceId, RecordId};
use tracing::{debug, warn};

/// Name of the blob carrying out-of-band ciphertext.
pub const BLOB_NAME: &str = "d";

/// An encrypted key-value store over a channel host.
///
/// Each namespace stores its pairs in one dedicated channel. A `set`
/// appends a record, a `get` returns the newest record for the key, and a
/// `del` removes every record for the key.
///
/// The store is `Send + Sync` when the host is, and can be shared across
/// threads behind an `Arc`.
///
/// # Example
///
/// ```rust
/// use chanvault_core::{Config, Store};
/// use chanvault_host::{InMemoryHost, NamespaceId};
///
/// let host = InMemoryHost::new("bot");
/// let ns = NamespaceId::new("guild");
/// host.add_namespace(&ns);
///
/// let store = Store::open(host, "my-app", Config::default()).unwrap();
/// store.set(&ns, "greeting", b"hello").unwrap();
/// assert_eq!(store.get(&ns, "greeting").unwrap(), b"hello");
///
/// store.del(&ns, "greeting").unwrap();
/// assert!(store.get(&ns, "greeting").unwrap_err().is_not_found());
/// ```
#[derive(Debug)]
pub struct Store<H: ChannelHost> {
    host: H,
    crypto: CryptoManager,
    config: Config,
    locator: ChannelLocator,
}

impl<H: ChannelHost> Store<H> {
    /// Opens a store for an application identity.
    ///
    /// The identity is the password for every value this store writes.
    /// Any store opened with the same identity reads them back.
    ///
    /// # Errors
    ///
    /// Returns an error if key derivation fails.
    pub fn open(host: H, app_id: &str, config: Config) -> CoreResult<Self> {
        let crypto = CryptoManager::new(app_id)?;
        Ok(Self::with_crypto(host, crypto, config))
    }

    /// Opens a store with prebuilt cryptography.
    #[must_use]
    pub fn with_crypto(host: H, crypto: CryptoManager, config: Config) -> Self {
        Self {
            host,
            crypto,
            config,
            locator: ChannelLocator::new(),
        }
    }

    /// Returns the host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the application identity.
    pub fn app_id(&self) -> &str {
        self.crypto.app_id()
    }

    /// Resolves a namespace's channel, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NamespaceUnavailable`] if the host cannot list
    /// or create the channel.
    pub fn channel(&self, namespace: &NamespaceId) -> CoreResult<ChannelId> {
        self.locator.resolve(&self.host, namespace)
    }

    /// Stores a value under a key.
    ///
    /// Small values travel inline in the record text. Larger ones travel
    /// as an attached blob. After a successful append the key's older
    /// records may be compacted, per [`Config::compaction`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty, the channel cannot be
    /// resolved, encryption fails, or the append fails. A failed append
    /// also drops the cached channel.
    pub fn set(&self, namespace: &NamespaceId, key: &str, value: &[u8]) -> CoreResult<()> {
        if key.is_empty() {
            return Err(CoreError::EmptyKey);
        }

        let channel = self.channel(namespace)?;
        let hash = self.crypto.hash_key(key);
        let sealed = self.crypto.encrypt(value)?;

        let (record, blob) =
            match DataLocation::for_payload(KEY_HASH_LEN, sealed.ciphertext.len()) {
                DataLocation::Inline => (
                    EncodedRecord::inline(hash.as_str(), sealed.nonce.to_vec(), sealed.ciphertext),
                    None,
                ),
                DataLocation::OutOfBand => (
                    EncodedRecord::out_of_band(hash.as_str(), sealed.nonce.to_vec()),
                    Some(Blob::octet_stream(BLOB_NAME, sealed.ciphertext)),
                ),
            };

        let id = self
            .host
            .append_record(channel, &serialize_record(&record), blob)
            .map_err(|e| self.evict(namespace, CoreError::Append(e)))?;
        debug!(%namespace, %channel, record = %id, location = ?record.location, "stored value");

        if self.config.compaction.should_compact() {
            self.compact_after_write(namespace, channel, &hash, id);
        }
        Ok(())
    }

    /// Returns the newest value stored under a key.
    ///
    /// Unless [`Config::accept_data_from_other_users`] is set, only records
    /// written by this host session's identity count.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no record matches. Returns
    /// another error if the channel cannot be resolved or scanned, the
    /// record is malformed, its blob cannot be fetched, or it does not
    /// decrypt.
    pub fn get(&self, namespace: &NamespaceId, key: &str) -> CoreResult<Vec<u8>> {
        let channel = self.channel(namespace)?;
        let filter = Filter::KeyHash {
            hash: self.crypto.hash_key(key),
            author: self.read_author(),
        };

        let outcome = scan(&self.host, channel, &filter, ScanLimits::newest())
            .map_err(|e| self.evict(namespace, CoreError::Scan(e)))?;
        let found = outcome.records.into_iter().next().ok_or(CoreError::NotFound)?;

        self.open_record(&found)
    }

    /// Deletes every record stored under a key.
    ///
    /// Deleting a key that has no records succeeds without deleting
    /// anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty, the channel cannot be
    /// resolved or scanned, or a delete batch fails. Batches before the
    /// failing one stay deleted.
    pub fn del(&self, namespace: &NamespaceId, key: &str) -> CoreResult<()> {
        if key.is_empty() {
            return Err(CoreError::EmptyKey);
        }

        let channel = self.channel(namespace)?;
        let filter = Filter::KeyHash {
            hash: self.crypto.hash_key(key),
            author: None,
        };

        let outcome = scan(&self.host, channel, &filter, ScanLimits::unbounded())
            .map_err(|e| self.evict(namespace, CoreError::Scan(e)))?;
        let ids: Vec<RecordId> = outcome.records.iter().map(|r| r.id).collect();

        let calls = delete_chunked(&self.host, channel, &ids).map_err(CoreError::BulkDelete)?;
        debug!(%namespace, %channel, deleted = ids.len(), calls, "deleted key");
        Ok(())
    }

    /// Compacts a key's records now, keeping the newest.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be resolved or scanned, or a
    /// delete batch fails.
    pub fn compact(&self, namespace: &NamespaceId, key: &str) -> CoreResult<CompactionStats> {
        let channel = self.channel(namespace)?;
        let hash = self.crypto.hash_key(key);

        compact(&self.host, channel, &hash, None).map_err(|e| match e {
            CoreError::Scan(_) => self.evict(namespace, e),
            e => e,
        })
    }

    /// Lists records written by an author in a namespace's channel,
    /// newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be resolved or scanned.
    pub fn authored_records(
        &self,
        namespace: &NamespaceId,
        author: &AuthorId,
        limit: Option<usize>,
    ) -> CoreResult<Vec<LogRecord>> {
        let channel = self.channel(namespace)?;
        let limits = ScanLimits {
            matches: limit,
            search: None,
        };

        scan(&self.host, channel, &Filter::Author(author.clone()), limits)
            .map(|outcome| outcome.records)
            .map_err(|e| self.evict(namespace, CoreError::Scan(e)))
    }

    fn read_author(&self) -> Option<AuthorId> {
        if self.config.accept_data_from_other_users {
            None
        } else {
            Some(self.host.identity())
        }
    }

    fn evict(&self, namespace: &NamespaceId, err: CoreError) -> CoreError {
        self.locator.evict(namespace);
        err
    }

    fn compact_after_write(
        &self,
        namespace: &NamespaceId,
        channel: ChannelId,
        hash: &str,
        written: RecordId,
    ) {
        match compact(&self.host, channel, hash, Some(written)) {
            Ok(stats) => debug!(%namespace, %channel, deleted = stats.deleted, "compacted key"),
            Err(e) => warn!(%namespace, %channel, error = %e, "compaction failed"),
        }
    }

    fn open_record(&self, found: &LogRecord) -> CoreResult<Vec<u8>> {
        let record = parse_record(&found.text)?;

        let ciphertext = match record.location {
            DataLocation::Inline => record.data,
            DataLocation::OutOfBand => {
                let attachment = found.attachments.first().ok_or_else(|| {
                    CoreError::malformed_record(format!(
                        "out-of-band record {} has no attachment",
                        found.id
                    ))
                })?;
                self.host
                    .fetch_blob(&attachment.url)
                    .map_err(CoreError::BlobFetch)?
            }
        };

        self.crypto.decrypt(&record.nonce, &ciphertext)
    }
}
