//! # Chanvault Core
//!
//! Encrypted key-value storage over an append-only channel log.
//!
//! This crate provides:
//! - Key derivation, key hashing and AES-256-GCM sealing ([`crypto`])
//! - Namespace to channel resolution with a per-namespace cache ([`locator`])
//! - Bounded backward scans over a channel ([`scan`])
//! - Compaction of superseded records ([`compaction`])
//! - The [`Store`] that ties them into `set`, `get` and `del`
//!
//! ## Guarantees
//!
//! - Keys never leave the process in clear form
//! - Values are authenticated; a tampered record fails to decrypt
//! - The newest record for a key wins; log order is the only version
//!
//! There are no transactions, range queries or secondary indexes.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod compaction;
mod config;
pub mod crypto;
mod error;
pub mod locator;
pub mod scan;
mod store;

pub use compaction::CompactionStats;
pub use config::{AppOption, CompactionPolicy, Config};
pub use error::{CoreError, CoreResult, ErrorKind};
pub use locator::{ChannelLocator, CHANNEL_NAME};
pub use scan::{Filter, ScanLimits, ScanOutcome};
pub use store::{Store, BLOB_NAME};
