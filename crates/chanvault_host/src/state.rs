//! Shared host state and the events that mutate it.
//!
//! Both reference hosts keep the same state. [`super::FileHost`] also writes
//! every [`HostEvent`] to its journal and replays the journal on open.

use crate::error::{HostError, HostResult};
use crate::host::{MAX_BULK_DELETE, MAX_PAGE_SIZE, MAX_RECORD_TEXT};
use crate::types::{ChannelId, ChannelInfo, ChannelSpec, LogRecord, NamespaceId, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A state mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub(crate) enum HostEvent {
    AddNamespace {
        namespace: NamespaceId,
    },
    CreateChannel {
        namespace: NamespaceId,
        channel: ChannelInfo,
        spec: ChannelSpec,
    },
    Append {
        channel: ChannelId,
        record: LogRecord,
    },
    Delete {
        channel: ChannelId,
        ids: Vec<RecordId>,
    },
    RemoveChannel {
        channel: ChannelId,
    },
}

#[derive(Debug)]
struct ChannelState {
    info: ChannelInfo,
    namespace: NamespaceId,
    spec: ChannelSpec,
    records: BTreeMap<RecordId, LogRecord>,
}

/// In-memory view of every namespace, channel and record.
#[derive(Debug, Default)]
pub(crate) struct HostState {
    next_id: u64,
    namespaces: HashMap<NamespaceId, Vec<ChannelId>>,
    channels: HashMap<ChannelId, ChannelState>,
}

impl HostState {
    /// Allocates the next ID. Channels and records share one sequence.
    pub(crate) fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub(crate) fn has_namespace(&self, namespace: &NamespaceId) -> bool {
        self.namespaces.contains_key(namespace)
    }

    pub(crate) fn list_channels(&self, namespace: &NamespaceId) -> HostResult<Vec<ChannelInfo>> {
        let ids = self
            .namespaces
            .get(namespace)
            .ok_or_else(|| HostError::UnknownNamespace(namespace.clone()))?;

        Ok(ids
            .iter()
            .filter_map(|id| self.channels.get(id))
            .map(|c| c.info.clone())
            .collect())
    }

    pub(crate) fn channel(&self, channel: ChannelId) -> HostResult<ChannelInfo> {
        self.channels
            .get(&channel)
            .map(|c| c.info.clone())
            .ok_or(HostError::UnknownChannel(channel))
    }

    pub(crate) fn channel_spec(&self, channel: ChannelId) -> HostResult<ChannelSpec> {
        self.channels
            .get(&channel)
            .map(|c| c.spec.clone())
            .ok_or(HostError::UnknownChannel(channel))
    }

    /// Returns the attachment URLs of the given records.
    pub(crate) fn attachment_urls(&self, channel: ChannelId, ids: &[RecordId]) -> Vec<String> {
        let Some(state) = self.channels.get(&channel) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| state.records.get(id))
            .flat_map(|r| r.attachments.iter().map(|a| a.url.clone()))
            .collect()
    }

    pub(crate) fn check_text(text: &str) -> HostResult<()> {
        let len = text.chars().count();
        if len > MAX_RECORD_TEXT {
            return Err(HostError::limit_exceeded("record text", len, MAX_RECORD_TEXT));
        }
        Ok(())
    }

    pub(crate) fn check_delete(&self, channel: ChannelId, ids: &[RecordId]) -> HostResult<()> {
        self.channel(channel)?;
        if ids.len() > MAX_BULK_DELETE {
            return Err(HostError::limit_exceeded(
                "bulk delete",
                ids.len(),
                MAX_BULK_DELETE,
            ));
        }
        Ok(())
    }

    /// Returns up to `limit` records older than `before`, newest first.
    pub(crate) fn list_records(
        &self,
        channel: ChannelId,
        limit: usize,
        before: Option<RecordId>,
    ) -> HostResult<Vec<LogRecord>> {
        if limit > MAX_PAGE_SIZE {
            return Err(HostError::limit_exceeded("page size", limit, MAX_PAGE_SIZE));
        }

        let state = self
            .channels
            .get(&channel)
            .ok_or(HostError::UnknownChannel(channel))?;

        let page = match before {
            Some(cursor) => state
                .records
                .range(..cursor)
                .rev()
                .take(limit)
                .map(|(_, r)| r.clone())
                .collect(),
            None => state
                .records
                .values()
                .rev()
                .take(limit)
                .cloned()
                .collect(),
        };

        Ok(page)
    }

    /// Returns every record of a channel, oldest first.
    pub(crate) fn records(&self, channel: ChannelId) -> HostResult<Vec<LogRecord>> {
        let state = self
            .channels
            .get(&channel)
            .ok_or(HostError::UnknownChannel(channel))?;
        Ok(state.records.values().cloned().collect())
    }

    /// Applies an event. Events referring to unknown entities are ignored,
    /// so a journal replays cleanly after a channel was removed.
    pub(crate) fn apply(&mut self, event: &HostEvent) {
        match event {
            HostEvent::AddNamespace { namespace } => {
                self.namespaces.entry(namespace.clone()).or_default();
            }
            HostEvent::CreateChannel {
                namespace,
                channel,
                spec,
            } => {
                self.bump(channel.id.as_u64());
                self.namespaces
                    .entry(namespace.clone())
                    .or_default()
                    .push(channel.id);
                self.channels.insert(
                    channel.id,
                    ChannelState {
                        info: channel.clone(),
                        namespace: namespace.clone(),
                        spec: spec.clone(),
                        records: BTreeMap::new(),
                    },
                );
            }
            HostEvent::Append { channel, record } => {
                self.bump(record.id.as_u64());
                if let Some(state) = self.channels.get_mut(channel) {
                    state.records.insert(record.id, record.clone());
                }
            }
            HostEvent::Delete { channel, ids } => {
                if let Some(state) = self.channels.get_mut(channel) {
                    for id in ids {
                        state.records.remove(id);
                    }
                }
            }
            HostEvent::RemoveChannel { channel } => {
                if let Some(state) = self.channels.remove(channel) {
                    if let Some(ids) = self.namespaces.get_mut(&state.namespace) {
                        ids.retain(|id| id != channel);
                    }
                }
            }
        }
    }

    fn bump(&mut self, seen: u64) {
        self.next_id = self.next_id.max(seen);
    }

    /// Builds the event for creating a channel.
    pub(crate) fn create_event(
        &mut self,
        namespace: &NamespaceId,
        spec: &ChannelSpec,
    ) -> HostResult<(ChannelInfo, HostEvent)> {
        if !self.has_namespace(namespace) {
            return Err(HostError::UnknownNamespace(namespace.clone()));
        }
        let channel = ChannelInfo {
            id: ChannelId::new(self.allocate_id()),
            name: spec.name.clone(),
        };
        let event = HostEvent::CreateChannel {
            namespace: namespace.clone(),
            channel: channel.clone(),
            spec: spec.clone(),
        };
        Ok((channel, event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccessPolicy, AuthorId};

    fn spec(name: &str) -> ChannelSpec {
        ChannelSpec {
            name: name.to_string(),
            topic: String::new(),
            policy: AccessPolicy::owner_only(AuthorId::new("bot")),
        }
    }

    fn record(id: u64) -> LogRecord {
        LogRecord {
            id: RecordId::new(id),
            text: format!("r{id}"),
            author: AuthorId::new("bot"),
            attachments: Vec::new(),
        }
    }

    fn state_with_channel() -> (HostState, ChannelId) {
        let ns = NamespaceId::new("g");
        let mut state = HostState::default();
        state.apply(&HostEvent::AddNamespace {
            namespace: ns.clone(),
        });
        let (channel, event) = state.create_event(&ns, &spec("kv")).unwrap();
        state.apply(&event);
        assert_eq!(state.list_channels(&ns).unwrap()[0], channel);
        (state, channel.id)
    }

    #[test]
    fn create_requires_namespace() {
        let mut state = HostState::default();
        let result = state.create_event(&NamespaceId::new("missing"), &spec("kv"));
        assert!(matches!(result, Err(HostError::UnknownNamespace(_))));
    }

    #[test]
    fn list_pages_newest_first() {
        let (mut state, chan) = state_with_channel();
        for _ in 0..5 {
            let id = state.allocate_id();
            state.apply(&HostEvent::Append {
                channel: chan,
                record: record(id),
            });
        }

        let first = state.list_records(chan, 2, None).unwrap();
        assert_eq!(first.len(), 2);
        assert!(first[0].id > first[1].id);

        let second = state.list_records(chan, 10, Some(first[1].id)).unwrap();
        assert_eq!(second.len(), 3);
        assert!(second.iter().all(|r| r.id < first[1].id));
    }

    #[test]
    fn page_size_is_capped() {
        let (state, chan) = state_with_channel();
        let result = state.list_records(chan, MAX_PAGE_SIZE + 1, None);
        assert!(matches!(result, Err(HostError::LimitExceeded { .. })));
    }

    #[test]
    fn replay_restores_id_sequence() {
        let (mut state, chan) = state_with_channel();
        state.apply(&HostEvent::Append {
            channel: chan,
            record: record(40),
        });
        assert_eq!(state.allocate_id(), 41);
    }

    #[test]
    fn remove_channel_unlists_it() {
        let (mut state, chan) = state_with_channel();
        state.apply(&HostEvent::RemoveChannel { channel: chan });
        assert!(state.list_channels(&NamespaceId::new("g")).unwrap().is_empty());
        assert!(matches!(
            state.channel(chan),
            Err(HostError::UnknownChannel(_))
        ));
    }

    proptest::proptest! {
        #[test]
        fn paging_visits_every_record_once(count in 0usize..250, page in 1usize..=MAX_PAGE_SIZE) {
            let (mut state, chan) = state_with_channel();
            for _ in 0..count {
                let id = state.allocate_id();
                state.apply(&HostEvent::Append { channel: chan, record: record(id) });
            }

            let mut seen = Vec::new();
            let mut cursor = None;
            loop {
                let batch = state.list_records(chan, page, cursor).unwrap();
                let Some(last) = batch.last() else { break };
                cursor = Some(last.id);
                seen.extend(batch.iter().map(|r| r.id));
            }

            proptest::prop_assert_eq!(seen.len(), count);
            proptest::prop_assert!(seen.windows(2).all(|w| w[0] > w[1]));
        }
    }

    #[test]
    fn oversized_text_rejected() {
        let text = "x".repeat(MAX_RECORD_TEXT + 1);
        assert!(HostState::check_text(&text).is_err());
        assert!(HostState::check_text(&"x".repeat(MAX_RECORD_TEXT)).is_ok());
    }
}
