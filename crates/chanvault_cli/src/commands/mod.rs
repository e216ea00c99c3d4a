//! CLI command implementations.

pub mod compact;
pub mod integrity;
pub mod kv;
pub mod namespace;
pub mod records;

use chanvault_core::{Config, Store};
use chanvault_host::FileHost;
use std::path::PathBuf;
use tracing::debug;

/// Options shared by every command that opens a store.
pub struct StoreArgs {
    pub dir: PathBuf,
    pub app: String,
    pub author: String,
    pub accept_others: bool,
    pub options: Vec<String>,
}

impl StoreArgs {
    /// Opens the directory host without a store around it.
    pub fn open_host(&self) -> Result<FileHost, Box<dyn std::error::Error>> {
        Ok(FileHost::open(&self.dir, self.author.as_str())?)
    }

    /// Opens a store over the directory host.
    pub fn open(&self) -> Result<Store<FileHost>, Box<dyn std::error::Error>> {
        let config = Config::new()
            .accept_data_from_other_users(self.accept_others)
            .options(&self.options)?;
        let host = self.open_host()?;
        debug!(dir = %self.dir.display(), author = %self.author, "opened host");
        Ok(Store::open(host, &self.app, config)?)
    }
}
