#![deny(missing_docs)]

//! # Ouroboros CLI
//!
//! Command line front end of the specification reconciliation engine.
//!
//! Supported Commands:
//! - `sync`: Reconciles the REST document against a scan of the running service.
//! - `import`: Merges an AsyncAPI YAML file into the WebSocket document.
//! - `heal`: Repairs (or creates) both persisted documents.
//! - `status`: Prints every operation with its diff/progress markers.

use crate::error::CliResult;
use clap::{Parser, Subcommand};

mod args;
mod error;
mod heal;
mod import;
mod scanner;
mod status;
mod sync;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Ouroboros specification reconciler")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile the REST spec with the scanned service.
    Sync(sync::SyncArgs),
    /// Import an AsyncAPI YAML document into the WebSocket spec.
    Import(import::ImportArgs),
    /// Repair missing sections of both specs.
    Heal(heal::HealArgs),
    /// Show all operations and their markers.
    Status(status::StatusArgs),
}

fn main() -> CliResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Sync(args) => {
            sync::execute(args)?;
        }
        Commands::Import(args) => {
            import::execute(args)?;
        }
        Commands::Heal(args) => heal::execute(args)?,
        Commands::Status(args) => status::execute(args)?,
    }

    Ok(())
}
