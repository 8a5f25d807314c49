#![deny(missing_docs)]

//! # Import Command
//!
//! Merges an AsyncAPI YAML file into the persisted WebSocket document.

use crate::args::WsSpecArg;
use crate::error::{CliError, CliResult};
use ouroboros_core::{ImportOutcome, WsSpecService};
use std::fs;
use std::path::PathBuf;

/// Arguments for the import command.
#[derive(clap::Args, Debug, Clone)]
pub struct ImportArgs {
    /// AsyncAPI document to import (`.yml` or `.yaml`).
    pub file: PathBuf,

    #[clap(flatten)]
    pub spec: WsSpecArg,
}

/// Executes the import and prints every renamed item.
pub fn execute(args: &ImportArgs) -> CliResult<ImportOutcome> {
    let file_name = args
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| CliError::General(format!("{} is not a file", args.file.display())))?;
    let content = fs::read_to_string(&args.file)?;

    let service = WsSpecService::open(&args.spec.ws_spec);
    let outcome = service.import_yaml(file_name, &content)?;

    println!("Imported {} item(s).", outcome.imported);
    for item in &outcome.renamed {
        match &item.action {
            Some(action) => println!(
                "  {} '{}' ({}) stored as '{}'",
                item.kind, item.original, action, item.renamed
            ),
            None => println!(
                "  {} '{}' stored as '{}'",
                item.kind, item.original, item.renamed
            ),
        }
    }
    Ok(outcome)
}
