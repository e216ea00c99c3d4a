//! # Chanvault Host
//!
//! The channel-hosting contract that chanvault stores its records in.
//!
//! A host is an external **append-only log service**. It organises logs
//! as channels inside tenant namespaces and lets a client append text
//! records with optional blobs, list them newest first in bounded pages,
//! and bulk-delete them. Hosts never interpret record text.
//!
//! ## Design Principles
//!
//! - Hosts are opaque record logs (append, page, delete)
//! - No knowledge of chanvault record formats or encryption
//! - Must be `Send + Sync` for concurrent access
//! - Service limits are part of the contract ([`MAX_PAGE_SIZE`],
//!   [`MAX_BULK_DELETE`], [`MAX_RECORD_TEXT`])
//!
//! ## Available Hosts
//!
//! - [`InMemoryHost`] - For tests, benchmarks and ephemeral stores
//! - [`FileHost`] - Persistent host backed by a local journal
//!
//! ## Example
//!
//! ```rust
//! use chanvault_host::{AccessPolicy, AuthorId, ChannelHost, ChannelSpec, InMemoryHost, NamespaceId};
//!
//! let host = InMemoryHost::new("bot");
//! let ns = NamespaceId::new("guild");
//! host.add_namespace(&ns);
//!
//! let spec = ChannelSpec {
//!     name: "log".into(),
//!     topic: String::new(),
//!     policy: AccessPolicy::owner_only(AuthorId::new("bot")),
//! };
//! let channel = host.create_channel(&ns, &spec).unwrap();
//! host.append_record(channel.id, "hello", None).unwrap();
//!
//! let page = host.list_records(channel.id, 10, None).unwrap();
//! assert_eq!(page[0].text, "hello");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod host;
mod memory;
mod state;
mod types;

pub use error::{HostError, HostResult};
pub use file::{FileHost, BLOB_DIR, JOURNAL_FILE};
pub use host::{ChannelHost, MAX_BULK_DELETE, MAX_PAGE_SIZE, MAX_RECORD_TEXT};
pub use memory::{HostOp, HostStats, InMemoryHost};
pub use types::{
    AccessPolicy, Attachment, AuthorId, Blob, ChannelId, ChannelInfo, ChannelSpec, LogRecord,
    NamespaceId, RecordId,
};
