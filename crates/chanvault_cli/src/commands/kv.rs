//! Timed key-value commands.

use chanvault_core::Store;
use chanvault_host::{ChannelHost, NamespaceId};
use std::time::Instant;

/// Stores a value.
pub fn set<H: ChannelHost>(
    store: &Store<H>,
    namespace: &NamespaceId,
    key: &str,
    value: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    store.set(namespace, key, value)?;
    println!("Set {key} ({} bytes) in {:?}", value.len(), start.elapsed());
    Ok(())
}

/// Prints the newest value of a key.
pub fn get<H: ChannelHost>(
    store: &Store<H>,
    namespace: &NamespaceId,
    key: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    match store.get(namespace, key) {
        Ok(value) => {
            let elapsed = start.elapsed();
            println!("{}", String::from_utf8_lossy(&value));
            println!("Got {key} ({} bytes) in {elapsed:?}", value.len());
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            println!("Key {key} not found ({:?})", start.elapsed());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Deletes every record of a key.
pub fn del<H: ChannelHost>(
    store: &Store<H>,
    namespace: &NamespaceId,
    key: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    store.del(namespace, key)?;
    println!("Deleted {key} in {:?}", start.elapsed());
    Ok(())
}
