//! Records command implementation.

use chanvault_core::Store;
use chanvault_host::{AuthorId, ChannelHost, NamespaceId};

/// Lists records an author wrote in a namespace's channel, newest first.
pub fn run<H: ChannelHost>(
    store: &Store<H>,
    namespace: &NamespaceId,
    author: &str,
    limit: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = store.authored_records(namespace, &AuthorId::new(author), limit)?;

    println!("Records by {author} in {namespace}: {}", records.len());
    for record in &records {
        let preview: String = record.text.chars().take(72).collect();
        let marker = if record.text.chars().count() > 72 { "..." } else { "" };
        println!(
            "  {:>8}  {:>2} blob(s)  {preview}{marker}",
            record.id,
            record.attachments.len()
        );
    }

    Ok(())
}
