//! Namespace commands.

use super::StoreArgs;
use chanvault_core::Store;
use chanvault_host::{ChannelHost, NamespaceId};

/// Registers a namespace with the directory host.
pub fn run(args: &StoreArgs, namespace: &NamespaceId) -> Result<(), Box<dyn std::error::Error>> {
    let host = args.open_host()?;
    host.add_namespace(namespace)?;
    println!("Namespace {namespace} ready in {}", host.path().display());
    Ok(())
}

/// Resolves a namespace's channel and prints its ID.
pub fn channel<H: ChannelHost>(
    store: &Store<H>,
    namespace: &NamespaceId,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = store.channel(namespace)?;
    println!("Channel for {namespace}: {id}");
    Ok(())
}
