//! Backward scan over a channel's records.
//!
//! Hosts have no index, so finding a key means paging backward from the
//! newest record and testing each one. Two limits bound the work:
//!
//! - `matches`: stop once this many records matched
//! - `search`: never examine more than this many records
//!
//! `None` leaves a limit unbounded. The search limit is exact. A page never
//! asks for more records than the limit has left.

use chanvault_codec::{parse_record, peek_key_hash};
use chanvault_host::{AuthorId, ChannelHost, ChannelId, HostResult, LogRecord, MAX_PAGE_SIZE};
use tracing::trace;

/// Records requested per page.
pub const PAGE_SIZE: usize = MAX_PAGE_SIZE;

/// Which records a scan collects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Records for one content address.
    KeyHash {
        /// Hex key hash to match.
        hash: String,
        /// When set, only records by this author match.
        author: Option<AuthorId>,
    },
    /// Every record by one author, parsable or not.
    Author(AuthorId),
}

impl Filter {
    /// Tests a record.
    ///
    /// Key-hash matches must parse as a whole record. Anything that does
    /// not parse is skipped.
    #[must_use]
    pub fn matches(&self, record: &LogRecord) -> bool {
        match self {
            Self::KeyHash { hash, author } => {
                if author.as_ref().is_some_and(|a| *a != record.author) {
                    return false;
                }
                if peek_key_hash(&record.text) != Some(hash.as_str()) {
                    return false;
                }
                match parse_record(&record.text) {
                    Ok(_) => true,
                    Err(e) => {
                        trace!(record = %record.id, error = %e, "skipping malformed record");
                        false
                    }
                }
            }
            Self::Author(author) => record.author == *author,
        }
    }
}

/// Bounds on a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanLimits {
    /// Maximum matches to collect.
    pub matches: Option<usize>,
    /// Maximum records to examine.
    pub search: Option<usize>,
}

impl ScanLimits {
    /// No bounds.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            matches: None,
            search: None,
        }
    }

    /// Only the newest match, searching the whole channel.
    #[must_use]
    pub const fn newest() -> Self {
        Self {
            matches: Some(1),
            search: None,
        }
    }

    /// Sets the match limit.
    #[must_use]
    pub const fn matches(mut self, limit: usize) -> Self {
        self.matches = Some(limit);
        self
    }

    /// Sets the search limit.
    #[must_use]
    pub const fn search(mut self, limit: usize) -> Self {
        self.search = Some(limit);
        self
    }
}

/// Result of a scan.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Matching records, newest first.
    pub records: Vec<LogRecord>,
    /// Records examined.
    pub examined: usize,
}

/// Scans a channel backward from its newest record.
///
/// # Errors
///
/// Returns the host error of the first page that fails to list.
pub fn scan<H: ChannelHost + ?Sized>(
    host: &H,
    channel: ChannelId,
    filter: &Filter,
    limits: ScanLimits,
) -> HostResult<ScanOutcome> {
    let mut outcome = ScanOutcome::default();
    let mut cursor = None;

    while limits.matches.map_or(true, |max| outcome.records.len() < max) {
        let page_size = match limits.search {
            Some(max) => PAGE_SIZE.min(max.saturating_sub(outcome.examined)),
            None => PAGE_SIZE,
        };
        if page_size == 0 {
            break;
        }

        let page = host.list_records(channel, page_size, cursor)?;
        let Some(oldest) = page.last() else {
            break;
        };
        cursor = Some(oldest.id);
        outcome.examined += page.len();

        outcome
            .records
            .extend(page.into_iter().filter(|r| filter.matches(r)));
    }

    if let Some(max) = limits.matches {
        outcome.records.truncate(max);
    }
    trace!(
        %channel,
        examined = outcome.examined,
        matched = outcome.records.len(),
        "scan finished"
    );
    Ok(outcome)
}
