//! # Spec Sync Pipeline
//!
//! One reconciliation pass of the file specification against a freshly scanned one:
//!
//! 1. Provisional `endpoint` operations from the previous pass are swept.
//! 2. File security schemes are carried onto the scan-derived components.
//! 3. Schemas are compared once for the whole pass.
//! 4. Every scanned path/method is reconciled (copied in, skipped, or compared).
//! 5. Schemas only the scan knows about are added to the file.
//!
//! Only the file specification is mutated.

use crate::error::AppResult;
use crate::extensions::{Diff, Progress};
use crate::oas::document::{Operation, RestApiSpec};
use crate::oas::methods::HttpMethod;
use crate::oas::request::RequestComparator;
use crate::oas::response::compare_responses_for_method;
use crate::schema::compare_schemas;
use std::collections::HashSet;
use std::fmt::Display;

/// Supplies the scanned specification of the running service.
pub trait Scanner {
    /// Produces a complete specification of the currently live routes.
    fn scan(&self) -> AppResult<RestApiSpec>;
}

/// Counters describing one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Provisional endpoint operations removed before reconciling.
    pub swept: usize,
    /// Scanned operations copied into the file as `endpoint`.
    pub added: usize,
    /// Operations that went through request (and maybe response) comparison.
    pub compared: usize,
    /// Operations skipped because the file still marks them `endpoint`.
    pub skipped_endpoint: usize,
    /// Operations skipped because the scan reports them as mocked.
    pub skipped_mock: usize,
    /// Operations whose request side differs.
    pub request_mismatches: usize,
    /// Operations whose responses differ.
    pub response_mismatches: usize,
    /// Scan-only schemas added to the file components.
    pub schemas_added: usize,
}

impl Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "swept={} added={} compared={} skipped(endpoint={}, mock={}) \
             request_mismatches={} response_mismatches={} schemas_added={}",
            self.swept,
            self.added,
            self.compared,
            self.skipped_endpoint,
            self.skipped_mock,
            self.request_mismatches,
            self.response_mismatches,
            self.schemas_added
        )
    }
}

/// Runs one reconciliation pass, mutating `file` in place.
pub fn synchronize(file: &mut RestApiSpec, scan: &RestApiSpec) -> SyncReport {
    let mut report = SyncReport {
        swept: sweep_provisional_endpoints(file),
        ..Default::default()
    };

    // `file` is reconciled in place, so its security schemes are never replaced
    // by the scan's (which cannot observe them).
    let schema_matches = compare_schemas(&scan.components.schemas, &file.components.schemas);
    let drifted = schema_matches
        .merged()
        .into_iter()
        .filter(|(_, same)| !same)
        .count();
    log::debug!("{} schema(s) differ between scan and file", drifted);
    let requests = RequestComparator::from_report(&schema_matches);

    for (path, scan_item) in &scan.paths {
        for method in HttpMethod::ALL {
            let Some(scan_op) = scan_item.operation(method) else {
                continue;
            };

            if file.operation(path, method).is_none() {
                add_endpoint(file, path, method, scan_op);
                report.added += 1;
                continue;
            }

            match file.operation_mut(path, method) {
                None => {}
                Some(file_op) if file_op.diff == Diff::Endpoint => {
                    log::debug!("{} {}: still an unreviewed endpoint", method, path);
                    report.skipped_endpoint += 1;
                }
                Some(_) if scan_op.progress == Progress::Mock => {
                    log::debug!("{} {}: scanned as mock, keeping file state", method, path);
                    report.skipped_mock += 1;
                }
                Some(file_op) => {
                    report.compared += 1;
                    if requests.compare_and_mark_request(path, file_op, scan_op, method) {
                        report.request_mismatches += 1;
                    }
                    if scan_op.uses_declared_responses() {
                        let mismatched = compare_responses_for_method(
                            path,
                            method,
                            Some(scan_op),
                            Some(file_op),
                            &schema_matches,
                        );
                        if mismatched.is_some_and(|statuses| !statuses.is_empty()) {
                            report.response_mismatches += 1;
                        }
                    }
                }
            }
        }
    }

    for (name, schema) in &scan.components.schemas {
        if !file.components.schemas.contains_key(name) {
            file.components
                .schemas
                .insert(name.clone(), schema.clone());
            report.schemas_added += 1;
        }
    }

    log::info!("Reconciliation pass finished: {}", report);
    report
}

/// Clears every method slot still marked `endpoint` and drops paths it left empty.
fn sweep_provisional_endpoints(file: &mut RestApiSpec) -> usize {
    let mut swept = 0;
    let mut emptied = HashSet::new();

    for (path, item) in file.paths.iter_mut() {
        for method in HttpMethod::ALL {
            if item
                .operation(method)
                .is_some_and(|op| op.diff == Diff::Endpoint)
            {
                item.set_operation(method, None);
                swept += 1;
                if item.has_no_operations() {
                    emptied.insert(path.clone());
                }
            }
        }
    }

    file.paths.retain(|path, _| !emptied.contains(path));
    swept
}

fn add_endpoint(file: &mut RestApiSpec, path: &str, method: HttpMethod, scan_op: &Operation) {
    let mut op = scan_op.clone();
    op.diff = Diff::Endpoint;
    op.response_marker = None;
    if op.id.is_none() {
        op.id = Some(uuid::Uuid::new_v4().to_string());
    }
    log::info!("{} {}: undeclared endpoint copied from scan", method, path);
    file.paths
        .entry(path.to_string())
        .or_default()
        .set_operation(method, Some(op));
}
