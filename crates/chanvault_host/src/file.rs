//! File-journaled channel host for persistent local use.

use crate::error::{HostError, HostResult};
use crate::host::ChannelHost;
use crate::state::{HostEvent, HostState};
use crate::types::{
    Attachment, AuthorId, Blob, ChannelId, ChannelInfo, ChannelSpec, LogRecord, NamespaceId,
    RecordId,
};
use parking_lot::{Mutex, RwLock};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the event journal inside the host directory.
pub const JOURNAL_FILE: &str = "host.jsonl";
/// Name of the blob directory inside the host directory.
pub const BLOB_DIR: &str = "blobs";

/// A channel host persisted in a local directory.
///
/// Every mutation is appended to a JSON-lines journal and flushed before
/// the call returns. Opening the directory replays the journal. Blobs are
/// stored as individual files and referenced by `file://` URLs.
///
/// # Crash Safety
///
/// A torn final journal line (a crash mid-write) is discarded on open and
/// the journal is truncated back to the last complete event. A malformed
/// line anywhere else is reported as corruption.
///
/// # Example
///
/// ```no_run
/// use chanvault_host::{ChannelHost, FileHost, NamespaceId};
/// use std::path::Path;
///
/// let host = FileHost::open(Path::new("kv-data"), "bot").unwrap();
/// host.add_namespace(&NamespaceId::new("guild")).unwrap();
/// ```
#[derive(Debug)]
pub struct FileHost {
    dir: PathBuf,
    author: AuthorId,
    state: RwLock<HostState>,
    journal: Mutex<File>,
}

impl FileHost {
    /// Opens or creates a host directory, appending as `author`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the journal
    /// is corrupted.
    pub fn open(dir: &Path, author: impl Into<String>) -> HostResult<Self> {
        fs::create_dir_all(dir.join(BLOB_DIR))?;

        let path = dir.join(JOURNAL_FILE);
        let mut journal = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        let mut contents = Vec::new();
        journal.read_to_end(&mut contents)?;

        let (state, valid_len) = Self::replay(&contents)?;
        if valid_len < contents.len() {
            warn!(
                path = %path.display(),
                discarded = contents.len() - valid_len,
                "discarding torn journal tail"
            );
            journal.set_len(valid_len as u64)?;
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            author: AuthorId::new(author),
            state: RwLock::new(state),
            journal: Mutex::new(journal),
        })
    }

    /// Returns the host directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Registers a namespace. Registering an existing namespace is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal cannot be written.
    pub fn add_namespace(&self, namespace: &NamespaceId) -> HostResult<()> {
        let mut state = self.state.write();
        if state.has_namespace(namespace) {
            return Ok(());
        }
        self.commit(
            &mut state,
            HostEvent::AddNamespace {
                namespace: namespace.clone(),
            },
        )
    }

    /// Returns every record of a channel, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel does not exist.
    pub fn records(&self, channel: ChannelId) -> HostResult<Vec<LogRecord>> {
        self.state.read().records(channel)
    }

    /// Replays journal bytes. Returns the state and the length of the
    /// valid prefix.
    ///
    /// The tail may end mid-character, so lines are split as bytes and
    /// only complete lines need to be valid UTF-8.
    fn replay(contents: &[u8]) -> HostResult<(HostState, usize)> {
        let mut state = HostState::default();
        let mut valid_len = 0usize;
        let mut lines = contents.split_inclusive(|b| *b == b'\n').peekable();

        while let Some(line) = lines.next() {
            let is_last = lines.peek().is_none();
            let terminated = line.ends_with(b"\n");
            match serde_json::from_slice::<HostEvent>(line) {
                Ok(event) if terminated => {
                    state.apply(&event);
                    valid_len += line.len();
                }
                // Complete JSON without a newline is still a torn write.
                Ok(_) if is_last => break,
                Err(_) if is_last && !terminated => break,
                Ok(_) | Err(_) => {
                    return Err(HostError::Corrupted(format!(
                        "malformed journal entry at byte {valid_len}"
                    )));
                }
            }
        }

        Ok((state, valid_len))
    }

    /// Writes an event to the journal, then applies it.
    fn commit(&self, state: &mut HostState, event: HostEvent) -> HostResult<()> {
        let mut line = serde_json::to_string(&event)
            .map_err(|e| HostError::Corrupted(format!("cannot encode event: {e}")))?;
        line.push('\n');

        let mut journal = self.journal.lock();
        journal.write_all(line.as_bytes())?;
        journal.flush()?;

        state.apply(&event);
        Ok(())
    }

    fn blob_path(&self, id: RecordId, name: &str) -> PathBuf {
        self.dir
            .join(BLOB_DIR)
            .join(format!("{}-{}", id.as_u64(), sanitize(name)))
    }

    fn append(&self, channel: ChannelId, text: &str, blob: Option<Blob>) -> HostResult<RecordId> {
        HostState::check_text(text)?;

        let mut state = self.state.write();
        state.channel(channel)?;
        let id = RecordId::new(state.allocate_id());

        let mut attachments = Vec::new();
        let mut blob_file = None;
        if let Some(blob) = blob {
            let path = self.blob_path(id, &blob.name);
            fs::write(&path, &blob.bytes)?;
            attachments.push(Attachment {
                url: format!("file://{}", path.display()),
            });
            blob_file = Some(path);
        }

        let committed = self.commit(
            &mut state,
            HostEvent::Append {
                channel,
                record: LogRecord {
                    id,
                    text: text.to_string(),
                    author: self.author.clone(),
                    attachments,
                },
            },
        );
        if let (Err(e), Some(path)) = (&committed, blob_file) {
            if let Err(remove) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %remove, "failed to remove orphaned blob");
            } else {
                debug!(path = %path.display(), error = %e, "removed blob of failed append");
            }
        }
        committed.map(|()| id)
    }
}

/// Keeps blob file names inside the blob directory.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
        .collect()
}

impl ChannelHost for FileHost {
    fn identity(&self) -> AuthorId {
        self.author.clone()
    }

    fn list_channels(&self, namespace: &NamespaceId) -> HostResult<Vec<ChannelInfo>> {
        self.state.read().list_channels(namespace)
    }

    fn channel(&self, channel: ChannelId) -> HostResult<ChannelInfo> {
        self.state.read().channel(channel)
    }

    fn create_channel(
        &self,
        namespace: &NamespaceId,
        spec: &ChannelSpec,
    ) -> HostResult<ChannelInfo> {
        let mut state = self.state.write();
        let (channel, event) = state.create_event(namespace, spec)?;
        self.commit(&mut state, event)?;
        debug!(%namespace, channel = %channel.id, "created channel");
        Ok(channel)
    }

    fn post_notice(&self, channel: ChannelId, text: &str) -> HostResult<()> {
        self.append(channel, text, None).map(|_| ())
    }

    fn append_record(
        &self,
        channel: ChannelId,
        text: &str,
        blob: Option<Blob>,
    ) -> HostResult<RecordId> {
        self.append(channel, text, blob)
    }

    fn list_records(
        &self,
        channel: ChannelId,
        limit: usize,
        before: Option<RecordId>,
    ) -> HostResult<Vec<LogRecord>> {
        self.state.read().list_records(channel, limit, before)
    }

    fn bulk_delete(&self, channel: ChannelId, ids: &[RecordId]) -> HostResult<()> {
        let mut state = self.state.write();
        state.check_delete(channel, ids)?;

        let urls = state.attachment_urls(channel, ids);
        self.commit(
            &mut state,
            HostEvent::Delete {
                channel,
                ids: ids.to_vec(),
            },
        )?;

        for url in urls {
            if let Some(path) = url.strip_prefix("file://") {
                if let Err(e) = fs::remove_file(path) {
                    warn!(%path, error = %e, "failed to remove blob file");
                }
            }
        }
        Ok(())
    }

    fn fetch_blob(&self, url: &str) -> HostResult<Vec<u8>> {
        let status = |status| HostError::BlobStatus {
            url: url.to_string(),
            status,
        };

        let path = Path::new(url.strip_prefix("file://").ok_or_else(|| status(400))?);
        let escapes = path
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir));
        if escapes || !path.starts_with(self.dir.join(BLOB_DIR)) {
            return Err(status(403));
        }

        fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => status(404),
            _ => HostError::Io(e),
        })
    }
}
