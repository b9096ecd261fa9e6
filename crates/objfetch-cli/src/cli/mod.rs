//! CLI for the objfetch remote-object fetcher.

mod commands;
mod filename;

use anyhow::Result;
use clap::{Parser, Subcommand};
use objfetch_core::config;
use objfetch_core::store::HttpStore;

use commands::{run_fetch, run_schemes, run_size};

/// Top-level CLI for the objfetch remote-object fetcher.
#[derive(Debug, Parser)]
#[command(name = "objfetch")]
#[command(about = "objfetch: HTTP(S) remote-object fetcher", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch an object and write it to a file.
    Fetch {
        /// HTTP/HTTPS URI of the object (may carry an `auth_token` query parameter).
        uri: String,

        /// Output path ("-" for stdout); defaults to the last URI path segment.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Probe the object size without downloading it (prints 0 on failure).
    Size {
        /// HTTP/HTTPS URI of the object.
        uri: String,
    },

    /// List URI schemes this fetcher answers for.
    Schemes,
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let store = HttpStore::new(cfg);

        match cli.command {
            CliCommand::Fetch { uri, output } => run_fetch(&store, &uri, output.as_deref())?,
            CliCommand::Size { uri } => run_size(&store, &uri),
            CliCommand::Schemes => run_schemes(&store),
        }

        Ok(())
    }
}
