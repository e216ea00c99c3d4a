//! Compact command implementation.

use chanvault_core::Store;
use chanvault_host::{ChannelHost, NamespaceId};

/// Removes superseded records of a key and prints what was done.
pub fn run<H: ChannelHost>(
    store: &Store<H>,
    namespace: &NamespaceId,
    key: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let stats = store.compact(namespace, key)?;

    println!("Compaction of {key}");
    println!("=================");
    println!("Records examined: {}", stats.examined);
    println!("Records matched:  {}", stats.matched);
    println!("Records deleted:  {}", stats.deleted);

    Ok(())
}
