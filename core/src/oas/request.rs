//! # Request Comparison
//!
//! Builds a `field:type` signature of an operation's request side (non-path
//! parameters plus request body) and marks the file operation when the file and
//! scanned signatures differ.

use crate::extensions::{Diff, Progress, TAG_NONE};
use crate::oas::document::Operation;
use crate::oas::methods::HttpMethod;
use crate::schema::compare::{count_deltas, CountDelta};
use crate::schema::flatten::{count_field, merge_counts, FlattenedSchemas, TypeCounts};
use crate::schema::SchemaMatchReport;

/// Key under which a body without inline properties is counted.
pub const BODY_FIELD: &str = "body";

/// Compares request signatures using the flattened schemas of one pass.
pub struct RequestComparator<'a> {
    file_flat: &'a FlattenedSchemas,
    scan_flat: &'a FlattenedSchemas,
}

impl<'a> RequestComparator<'a> {
    /// Creates a comparator from precomputed flattened schema tables.
    pub fn new(file_flat: &'a FlattenedSchemas, scan_flat: &'a FlattenedSchemas) -> Self {
        Self {
            file_flat,
            scan_flat,
        }
    }

    /// Creates a comparator reusing the tables computed by the schema comparison.
    pub fn from_report(report: &'a SchemaMatchReport) -> Self {
        Self::new(report.file_flattened(), report.scan_flattened())
    }

    /// Compares the request side and updates `diff`, `progress`, `tag` and the diff log
    /// of `file_op` in place.
    ///
    /// Returns true when the request differs.
    pub fn compare_and_mark_request(
        &self,
        path: &str,
        file_op: &mut Operation,
        scan_op: &Operation,
        method: HttpMethod,
    ) -> bool {
        let spec = request_signature(file_op, self.file_flat);
        let scan = request_signature(scan_op, self.scan_flat);
        let deltas = count_deltas(&spec, &scan);

        if deltas.is_empty() {
            file_op.diff = file_op.diff.after_request(false);
            file_op.progress = progress_for(file_op.diff);
            file_op.diff_log = None;
            log::debug!("{} {}: request matches", method, path);
            return false;
        }

        file_op.diff = file_op.diff.after_request(true);
        file_op.progress = Progress::Mock;
        file_op.tag = Some(TAG_NONE.to_string());
        file_op.diff_log = Some(render_diff_log(path, method, &deltas));
        log::debug!(
            "{} {}: request differs in {} key(s)",
            method,
            path,
            deltas.len()
        );
        true
    }
}

/// Type-count signature of an operation's request side.
///
/// Path parameters are skipped, as are parameters without a name or a schema.
/// A body media type with inline properties is counted per property, any other
/// body is counted under [`BODY_FIELD`]. Referenced schemas are merged in from
/// `flat` without being flattened again.
pub fn request_signature(op: &Operation, flat: &FlattenedSchemas) -> TypeCounts {
    let mut counts = TypeCounts::new();
    let mut resolve = |target: &str| flat.get(target).cloned().unwrap_or_default();

    for param in op.parameters.iter().filter(|p| !p.is_path()) {
        let (Some(name), Some(schema)) = (param.name.as_deref(), param.schema.as_ref()) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        count_field(name, schema, &mut resolve, &mut counts);
    }

    if let Some(body) = &op.request_body {
        for media in body.content.values() {
            let Some(schema) = media.schema.as_ref() else {
                continue;
            };
            match schema.properties.as_ref().filter(|p| !p.is_empty()) {
                Some(props) => {
                    for (prop_name, prop) in props {
                        count_field(prop_name, prop, &mut resolve, &mut counts);
                    }
                }
                None => match schema.ref_name() {
                    Some(target) => merge_counts(&mut counts, resolve(&target)),
                    None => count_field(BODY_FIELD, schema, &mut resolve, &mut counts),
                },
            }
        }
    }

    counts
}

/// `completed` once no side drifts, `mock` otherwise.
pub(crate) fn progress_for(diff: Diff) -> Progress {
    if diff == Diff::None {
        Progress::Completed
    } else {
        Progress::Mock
    }
}

fn render_diff_log(path: &str, method: HttpMethod, deltas: &[CountDelta]) -> String {
    let mut log = format!("Request mismatch on {} {}:", method, path);
    for delta in deltas {
        log.push_str("\n- ");
        log.push_str(&delta.to_string());
    }
    log
}
