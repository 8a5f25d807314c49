#![deny(missing_docs)]

//! # Status Command
//!
//! Prints every REST and WebSocket operation in the JSON view.

use crate::args::{RestSpecArg, WsSpecArg};
use crate::error::CliResult;
use ouroboros_core::{RestSpecService, WsSpecService};
use serde_json::{json, Value};

/// Arguments for the status command.
#[derive(clap::Args, Debug, Clone)]
pub struct StatusArgs {
    #[clap(flatten)]
    pub rest: RestSpecArg,

    #[clap(flatten)]
    pub ws: WsSpecArg,
}

/// Collects the operation views of both documents.
pub fn collect(args: &StatusArgs) -> CliResult<Value> {
    let rest = RestSpecService::open(&args.rest.rest_spec).list_operations()?;
    let ws = WsSpecService::open(&args.ws.ws_spec).list_operations()?;
    Ok(json!({ "rest": rest, "websocket": ws }))
}

/// Prints the status as pretty JSON.
pub fn execute(args: &StatusArgs) -> CliResult<()> {
    let status = collect(args)?;
    let text = serde_json::to_string_pretty(&status)
        .map_err(|e| crate::error::CliError::General(e.to_string()))?;
    println!("{}", text);
    Ok(())
}
