//! Removal of superseded records.
//!
//! Records are never rewritten, so every `set` leaves the previous record
//! for its key behind. Compaction finds a key's records near the head of
//! the channel and bulk-deletes all but the one to keep.
//!
//! ## Invariants
//!
//! - Compaction **MUST NOT** change what `get` returns
//! - The kept record is the newest match, or the one just written
//! - Only the newest [`COMPACTION_SEARCH_LIMIT`] records are examined

use crate::error::{CoreError, CoreResult};
use crate::scan::{scan, Filter, ScanLimits};
use chanvault_host::{ChannelHost, ChannelId, HostResult, RecordId, MAX_BULK_DELETE};

/// Records examined by one compaction pass.
pub const COMPACTION_SEARCH_LIMIT: usize = 100;

/// Result of a compaction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactionStats {
    /// Records examined.
    pub examined: usize,
    /// Records found for the key.
    pub matched: usize,
    /// Records deleted.
    pub deleted: usize,
}

/// Deletes superseded records for `hash`.
///
/// With `keep = Some(id)` every match except `id` goes. With `None` the
/// newest match stays.
///
/// # Errors
///
/// Returns [`CoreError::Scan`] if the scan fails and
/// [`CoreError::BulkDelete`] if a delete batch fails.
pub fn compact<H: ChannelHost + ?Sized>(
    host: &H,
    channel: ChannelId,
    hash: &str,
    keep: Option<RecordId>,
) -> CoreResult<CompactionStats> {
    let filter = Filter::KeyHash {
        hash: hash.to_string(),
        author: None,
    };
    let outcome = scan(
        host,
        channel,
        &filter,
        ScanLimits::default().search(COMPACTION_SEARCH_LIMIT),
    )
    .map_err(CoreError::Scan)?;

    let keep = keep.or_else(|| outcome.records.first().map(|r| r.id));
    let stale: Vec<RecordId> = outcome
        .records
        .iter()
        .map(|r| r.id)
        .filter(|id| Some(*id) != keep)
        .collect();

    delete_chunked(host, channel, &stale).map_err(CoreError::BulkDelete)?;

    Ok(CompactionStats {
        examined: outcome.examined,
        matched: outcome.records.len(),
        deleted: stale.len(),
    })
}

/// Deletes records in batches of at most [`MAX_BULK_DELETE`].
///
/// Stops at the first failing batch. Earlier batches stay deleted.
/// Returns the number of calls made.
///
/// # Errors
///
/// Returns the error of the failing batch.
pub fn delete_chunked<H: ChannelHost + ?Sized>(
    host: &H,
    channel: ChannelId,
    ids: &[RecordId],
) -> HostResult<usize> {
    let mut calls = 0;
    for batch in ids.chunks(MAX_BULK_DELETE) {
        host.bulk_delete(channel, batch)?;
        calls += 1;
    }
    Ok(calls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chanvault_host::{AccessPolicy, ChannelSpec, HostOp, InMemoryHost, NamespaceId};

    fn channel(host: &InMemoryHost) -> ChannelId {
        let ns = NamespaceId::new("g");
        host.add_namespace(&ns);
        host.create_channel(
            &ns,
            &ChannelSpec {
                name: "kv".into(),
                topic: String::new(),
                policy: AccessPolicy::owner_only(host.identity()),
            },
        )
        .unwrap()
        .id
    }

    fn append(host: &InMemoryHost, chan: ChannelId, hash: &str) -> RecordId {
        host.append_record(chan, &format!("{hash},0,00,00"), None)
            .unwrap()
    }

    fn remaining(host: &InMemoryHost, chan: ChannelId) -> Vec<RecordId> {
        host.records(chan).unwrap().iter().map(|r| r.id).collect()
    }

    #[test]
    fn keeps_newest_by_default() {
        let host = InMemoryHost::new("bot");
        let chan = channel(&host);
        append(&host, chan, "aa");
        let other = append(&host, chan, "bb");
        append(&host, chan, "aa");
        let newest = append(&host, chan, "aa");

        let stats = compact(&host, chan, "aa", None).unwrap();
        assert_eq!(
            stats,
            CompactionStats {
                examined: 4,
                matched: 3,
                deleted: 2
            }
        );
        assert_eq!(remaining(&host, chan), vec![other, newest]);
    }

    #[test]
    fn keeps_requested_record() {
        let host = InMemoryHost::new("bot");
        let chan = channel(&host);
        let older = append(&host, chan, "aa");
        append(&host, chan, "aa");

        compact(&host, chan, "aa", Some(older)).unwrap();
        assert_eq!(remaining(&host, chan), vec![older]);
    }

    #[test]
    fn only_head_of_channel_examined() {
        let host = InMemoryHost::new("bot");
        let chan = channel(&host);
        let buried = append(&host, chan, "aa");
        for _ in 0..COMPACTION_SEARCH_LIMIT {
            append(&host, chan, "bb");
        }
        append(&host, chan, "aa");

        let stats = compact(&host, chan, "aa", None).unwrap();
        assert_eq!(stats.examined, COMPACTION_SEARCH_LIMIT);
        assert_eq!(stats.deleted, 0);
        assert!(remaining(&host, chan).contains(&buried));
    }

    #[test]
    fn nothing_to_delete_makes_no_calls() {
        let host = InMemoryHost::new("bot");
        let chan = channel(&host);
        append(&host, chan, "aa");

        compact(&host, chan, "aa", None).unwrap();
        assert_eq!(host.stats().bulk_deletes, 0);
    }

    #[test]
    fn failures_keep_their_kind() {
        let host = InMemoryHost::new("bot");
        let chan = channel(&host);
        append(&host, chan, "aa");
        append(&host, chan, "aa");

        host.fail_next(HostOp::ListRecords);
        assert!(matches!(
            compact(&host, chan, "aa", None),
            Err(CoreError::Scan(_))
        ));

        host.fail_next(HostOp::BulkDelete);
        assert!(matches!(
            compact(&host, chan, "aa", None),
            Err(CoreError::BulkDelete(_))
        ));
    }

    #[test]
    fn chunked_delete_batches() {
        let host = InMemoryHost::new("bot");
        let chan = channel(&host);
        let ids: Vec<_> = (0..250).map(|_| append(&host, chan, "aa")).collect();

        assert_eq!(delete_chunked(&host, chan, &ids).unwrap(), 3);
        assert!(remaining(&host, chan).is_empty());
        assert_eq!(delete_chunked(&host, chan, &[]).unwrap(), 0);
    }

    #[test]
    fn chunked_delete_stops_at_failure() {
        let host = InMemoryHost::new("bot");
        let chan = channel(&host);
        let ids: Vec<_> = (0..150).map(|_| append(&host, chan, "aa")).collect();

        host.fail_next(HostOp::BulkDelete);
        assert!(delete_chunked(&host, chan, &ids).is_err());
        assert_eq!(remaining(&host, chan).len(), 150);
    }
}
