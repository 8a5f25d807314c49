#![deny(missing_docs)]

//! # Sync Command
//!
//! Runs one reconciliation pass of the REST document against the running service.

use crate::args::RestSpecArg;
use crate::error::CliResult;
use crate::scanner::scanner_for;
use ouroboros_core::{RestSpecService, SyncReport};

/// Arguments for the sync command.
#[derive(clap::Args, Debug, Clone)]
pub struct SyncArgs {
    #[clap(flatten)]
    pub spec: RestSpecArg,

    /// Scanned specification: a YAML/JSON file or an `http(s)://` URL.
    #[clap(long, env = "OUROBOROS_SCAN_SOURCE")]
    pub scan: String,
}

/// Executes the reconciliation pass.
pub fn execute(args: &SyncArgs) -> CliResult<SyncReport> {
    let scanner = scanner_for(&args.scan)?;
    let service = RestSpecService::open(&args.spec.rest_spec);
    let report = service.reconcile(scanner.as_ref())?;
    println!("{}", report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ouroboros_core::{Diff, HttpMethod, RestApiSpec};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sync_from_file_source() {
        let dir = tempdir().unwrap();
        let scan = dir.path().join("scan.yml");
        fs::write(
            &scan,
            "openapi: 3.1.0\npaths:\n  /orders:\n    post:\n      responses: {}\n",
        )
        .unwrap();
        let spec = dir.path().join("ouroboros/rest/ourorest.yml");

        let args = SyncArgs {
            spec: RestSpecArg {
                rest_spec: spec.clone(),
            },
            scan: scan.to_string_lossy().into_owned(),
        };
        let report = execute(&args).unwrap();
        assert_eq!(report.added, 1);

        let written: RestApiSpec = serde_yaml::from_str(&fs::read_to_string(&spec).unwrap()).unwrap();
        let op = written.operation("/orders", HttpMethod::Post).unwrap();
        assert_eq!(op.diff, Diff::Endpoint);
    }
}
