//! Benchmark utilities.

use chanvault_host::{AccessPolicy, ChannelHost, ChannelId, ChannelSpec, InMemoryHost, NamespaceId};
use rand::Rng;

/// Namespace every benchmark host is seeded with.
pub const BENCH_NAMESPACE: &str = "bench";

/// Generate random data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate a random lowercase hex string, shaped like a key hash.
pub fn random_hash() -> String {
    let mut rng = rand::thread_rng();
    (0..64)
        .map(|_| char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
        .collect()
}

/// Create an in-memory host with the bench namespace registered.
pub fn seeded_host() -> (InMemoryHost, NamespaceId) {
    let host = InMemoryHost::new("bench-bot");
    let ns = NamespaceId::new(BENCH_NAMESPACE);
    host.add_namespace(&ns);
    (host, ns)
}

/// Create a channel filled with `count` records of random key hashes.
///
/// Returns the channel and the hash of the oldest record.
pub fn filled_channel(host: &InMemoryHost, ns: &NamespaceId, count: usize) -> (ChannelId, String) {
    let spec = ChannelSpec {
        name: "bench".into(),
        topic: String::new(),
        policy: AccessPolicy::owner_only(host.identity()),
    };
    let channel = host
        .create_channel(ns, &spec)
        .map(|c| c.id)
        .unwrap_or_else(|e| panic!("bench channel: {e}"));

    let oldest = random_hash();
    for i in 0..count {
        let hash = if i == 0 { oldest.clone() } else { random_hash() };
        let text = format!("{hash},0,000000000000000000000000,{}", "ab".repeat(64));
        host.append_record(channel, &text, None)
            .unwrap_or_else(|e| panic!("bench append: {e}"));
    }
    (channel, oldest)
}
