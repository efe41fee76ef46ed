//! namevault CLI
//!
//! Command-line interface for inspecting and managing the persisted DNS
//! record set.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use namevault_core::{Config, Store};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "namevault")]
#[command(about = "Durable storage for DNS resource records")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Connection URI overriding the configured storage backend
    #[arg(long, global = true)]
    storage: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add or replace the records for a domain
    Add {
        /// Domain the records answer for
        domain: String,
        /// Answer payload; repeat for multiple records
        #[arg(long, required = true)]
        address: Vec<String>,
        /// Time-to-live in seconds
        #[arg(long, default_value_t = 60)]
        ttl: u32,
        /// Record type
        #[arg(long = "type", default_value = "A")]
        rtype: String,
        /// Record class
        #[arg(long, default_value = "IN")]
        class: String,
    },
    /// Show the records stored for a domain
    Get { domain: String },
    /// List every stored record
    List,
    /// Delete the records for a domain
    Delete { domain: String },
    /// Replace the whole record set from a JSON file
    Import {
        /// Path to a JSON array of resources
        file: PathBuf,
    },
    /// Show which backend is active and how many records it holds
    Status,
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    let config = Config::load()?;
    let uri = cli.storage.unwrap_or(config.storage);
    let store = Store::open(&uri)?;

    match cli.command {
        Commands::Add {
            domain,
            address,
            ttl,
            rtype,
            class,
        } => commands::add(&store, domain, address, ttl, rtype, class, &output),
        Commands::Get { domain } => commands::get(&store, &domain, &output),
        Commands::List => commands::list(&store, &output),
        Commands::Delete { domain } => commands::delete(&store, &domain, &output),
        Commands::Import { file } => commands::import(&store, &file, &output),
        Commands::Status => commands::status(&store, &uri, &output),
    }
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("namevault_core=info,namevault=info"));

    // Ignore error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
