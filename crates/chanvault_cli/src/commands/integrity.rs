//! Integrity command implementation.
//!
//! Writes random values of several sizes under one key and reads each back,
//! reporting timings and whether the bytes survived.

use chanvault_core::{CoreResult, Store};
use chanvault_host::{ChannelHost, NamespaceId};
use rand::RngCore;
use std::time::{Duration, Instant};

/// Outcome of one write and read-back.
#[derive(Debug)]
pub struct Trial {
    pub size: usize,
    pub write: Duration,
    pub read: Duration,
    pub matched: bool,
}

/// Runs one trial per size in order.
///
/// # Errors
///
/// Returns the first store error.
pub fn check<H: ChannelHost>(
    store: &Store<H>,
    namespace: &NamespaceId,
    key: &str,
    sizes: &[usize],
) -> CoreResult<Vec<Trial>> {
    let mut rng = rand::thread_rng();
    let mut trials = Vec::with_capacity(sizes.len());

    for &size in sizes {
        let mut value = vec![0u8; size];
        rng.fill_bytes(&mut value);

        let start = Instant::now();
        store.set(namespace, key, &value)?;
        let write = start.elapsed();

        let start = Instant::now();
        let read_back = store.get(namespace, key)?;
        let read = start.elapsed();

        trials.push(Trial {
            size,
            write,
            read,
            matched: read_back == value,
        });
    }

    Ok(trials)
}

/// Runs the integrity check and prints a table of results.
pub fn run<H: ChannelHost>(
    store: &Store<H>,
    namespace: &NamespaceId,
    key: &str,
    sizes: &[usize],
) -> Result<(), Box<dyn std::error::Error>> {
    let trials = check(store, namespace, key, sizes)?;

    println!("Integrity check on {namespace}/{key}");
    println!("====================================");
    for trial in &trials {
        println!(
            "{:>7} bytes  write {:>10.2?}  read {:>10.2?}  {}",
            trial.size,
            trial.write,
            trial.read,
            if trial.matched { "OK" } else { "MISMATCH" }
        );
    }

    let failed = trials.iter().filter(|t| !t.matched).count();
    if failed > 0 {
        return Err(format!("{failed} of {} values did not survive", trials.len()).into());
    }
    println!("All {} values survived", trials.len());

    Ok(())
}
