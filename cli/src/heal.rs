#![deny(missing_docs)]

//! # Heal Command
//!
//! Repairs both persisted documents (creating them if absent).

use crate::args::{RestSpecArg, WsSpecArg};
use crate::error::CliResult;
use ouroboros_core::{AsyncApiSpec, RestApiSpec, SpecStore};

/// Arguments for the heal command.
#[derive(clap::Args, Debug, Clone)]
pub struct HealArgs {
    #[clap(flatten)]
    pub rest: RestSpecArg,

    #[clap(flatten)]
    pub ws: WsSpecArg,
}

/// Heals both documents, printing what was repaired.
pub fn execute(args: &HealArgs) -> CliResult<()> {
    let rest: SpecStore<RestApiSpec> = SpecStore::open(&args.rest.rest_spec);
    report(&args.rest.rest_spec.display().to_string(), rest.heal()?);

    let ws: SpecStore<AsyncApiSpec> = SpecStore::open(&args.ws.ws_spec);
    report(&args.ws.ws_spec.display().to_string(), ws.heal()?);
    Ok(())
}

fn report(path: &str, repaired: Vec<String>) {
    if repaired.is_empty() {
        println!("{}: ok", path);
    } else {
        println!("{}: repaired {}", path, repaired.join(", "));
    }
}
