//! Chanvault CLI
//!
//! Command-line tools for a chanvault store kept in a local directory.
//!
//! # Commands
//!
//! - `add-namespace` - Register a namespace with the local host
//! - `channel` - Resolve a namespace's channel
//! - `set`, `get`, `del` - Key-value operations, timed
//! - `compact` - Remove superseded records for a key
//! - `integrity` - Write and read back random values of several sizes
//! - `records` - List records written by an author

mod commands;

use chanvault_host::NamespaceId;
use clap::{Parser, Subcommand};
use commands::StoreArgs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Chanvault command-line tools.
#[derive(Parser)]
#[command(name = "chanvault")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the host journal and blobs
    #[arg(global = true, short, long, default_value = "chanvault-data")]
    dir: PathBuf,

    /// Application identity; the password for stored values
    #[arg(global = true, long, default_value = "chanvault-demo")]
    app: String,

    /// Author identity records are written under
    #[arg(global = true, long, default_value = "chanvault")]
    author: String,

    /// Read records written by other authors
    #[arg(global = true, long)]
    accept_others: bool,

    /// Store option by name (repeatable)
    #[arg(global = true, long = "option", value_name = "NAME")]
    options: Vec<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a namespace with the local host
    AddNamespace {
        /// Namespace ID
        namespace: String,
    },

    /// Resolve a namespace's channel, creating it if missing
    Channel {
        /// Namespace ID
        namespace: String,
    },

    /// Store a value
    Set {
        /// Namespace ID
        namespace: String,
        /// Key
        key: String,
        /// Value
        value: String,
    },

    /// Print the newest value of a key
    Get {
        /// Namespace ID
        namespace: String,
        /// Key
        key: String,
    },

    /// Delete every record of a key
    Del {
        /// Namespace ID
        namespace: String,
        /// Key
        key: String,
    },

    /// Remove superseded records of a key
    Compact {
        /// Namespace ID
        namespace: String,
        /// Key
        key: String,
    },

    /// Write random values and read them back
    Integrity {
        /// Namespace ID
        namespace: String,

        /// Value sizes in bytes
        #[arg(short, long, value_delimiter = ',', default_value = "100,100,300,600,1000,100")]
        sizes: Vec<usize>,

        /// Key to write under
        #[arg(short, long, default_value = "integrity")]
        key: String,
    },

    /// List records written by an author
    Records {
        /// Namespace ID
        namespace: String,

        /// Author to list (defaults to --author)
        #[arg(long = "by")]
        by: Option<String>,

        /// Maximum records to list
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = StoreArgs {
        dir: cli.dir,
        app: cli.app,
        author: cli.author,
        accept_others: cli.accept_others,
        options: cli.options,
    };

    match cli.command {
        Commands::AddNamespace { namespace } => {
            commands::namespace::run(&args, &NamespaceId::new(namespace))?;
        }
        Commands::Channel { namespace } => {
            let store = args.open()?;
            commands::namespace::channel(&store, &NamespaceId::new(namespace))?;
        }
        Commands::Set {
            namespace,
            key,
            value,
        } => {
            let store = args.open()?;
            commands::kv::set(&store, &NamespaceId::new(namespace), &key, value.as_bytes())?;
        }
        Commands::Get { namespace, key } => {
            let store = args.open()?;
            commands::kv::get(&store, &NamespaceId::new(namespace), &key)?;
        }
        Commands::Del { namespace, key } => {
            let store = args.open()?;
            commands::kv::del(&store, &NamespaceId::new(namespace), &key)?;
        }
        Commands::Compact { namespace, key } => {
            let store = args.open()?;
            commands::compact::run(&store, &NamespaceId::new(namespace), &key)?;
        }
        Commands::Integrity {
            namespace,
            sizes,
            key,
        } => {
            let store = args.open()?;
            commands::integrity::run(&store, &NamespaceId::new(namespace), &key, &sizes)?;
        }
        Commands::Records {
            namespace,
            by,
            limit,
        } => {
            let store = args.open()?;
            let author = by.unwrap_or_else(|| args.author.clone());
            commands::records::run(&store, &NamespaceId::new(namespace), &author, limit)?;
        }
    }

    Ok(())
}
