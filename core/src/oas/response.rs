//! # Response Comparison
//!
//! Compares declared responses per status code. Content-type strings are ignored;
//! only the referenced or inline schema under each media type matters.
//!
//! - A status code only the scan produces is copied into the file (newly observed).
//! - A status code only the file declares is a mismatch (claimed, never observed).

use crate::oas::document::{ApiResponse, MediaType, Operation};
use crate::oas::methods::HttpMethod;
use crate::oas::request::progress_for;
use crate::refs::schema_ref_name;
use crate::schema::flatten::element_signature;
use crate::schema::{Schema, SchemaMatchReport};
use indexmap::IndexMap;

/// Content type matching any concrete content type.
pub const WILDCARD_CONTENT_TYPE: &str = "*/*";

/// Compares responses of one method and marks `file_op` in place.
///
/// No-op (returns `None`) when either operation is absent; otherwise returns the
/// status codes judged mismatching.
pub fn compare_responses_for_method(
    path: &str,
    method: HttpMethod,
    scan_op: Option<&Operation>,
    file_op: Option<&mut Operation>,
    schema_matches: &SchemaMatchReport,
) -> Option<Vec<String>> {
    let (Some(scan_op), Some(file_op)) = (scan_op, file_op) else {
        return None;
    };

    let mut mismatched = Vec::new();

    for (status, scan_response) in &scan_op.responses {
        match file_op.responses.get(status) {
            None => {
                log::debug!("{} {}: status {} newly observed", method, path, status);
                file_op
                    .responses
                    .insert(status.clone(), scan_response.clone());
            }
            Some(file_response) => {
                if !responses_match(scan_response, file_response, schema_matches) {
                    mismatched.push(status.clone());
                }
            }
        }
    }

    for status in file_op.responses.keys() {
        if !scan_op.responses.contains_key(status) {
            log::debug!("{} {}: status {} never observed", method, path, status);
            mismatched.push(status.clone());
        }
    }

    let differs = !mismatched.is_empty();
    file_op.diff = file_op.diff.after_response(differs);
    file_op.progress = progress_for(file_op.diff);

    Some(mismatched)
}

/// True when every media type on each side has a matching schema on the other side.
pub fn responses_match(
    scan: &ApiResponse,
    file: &ApiResponse,
    schema_matches: &SchemaMatchReport,
) -> bool {
    match (scan.content.is_empty(), file.content.is_empty()) {
        (true, true) => return true,
        (true, false) | (false, true) => return false,
        (false, false) => {}
    }

    let covers = |from: &IndexMap<String, MediaType>, to: &IndexMap<String, MediaType>| {
        from.iter().all(|(content_type, media)| {
            counterpart(content_type, to).is_some_and(|other| {
                schemas_match(media.schema.as_ref(), other.schema.as_ref(), schema_matches)
            })
        })
    };

    covers(&scan.content, &file.content) && covers(&file.content, &scan.content)
}

/// Two response schemas match when both reference the same equivalent schema, or
/// both are inline with the same type.
pub fn schemas_match(
    a: Option<&Schema>,
    b: Option<&Schema>,
    schema_matches: &SchemaMatchReport,
) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => match (a.reference.as_deref(), b.reference.as_deref()) {
            (Some(ref_a), Some(ref_b)) => {
                match (schema_ref_name(ref_a), schema_ref_name(ref_b)) {
                    (Some(name_a), Some(name_b)) => {
                        name_a == name_b && schema_matches.is_same(&name_a)
                    }
                    _ => false,
                }
            }
            (None, None) => inline_types_match(a, b),
            _ => false,
        },
        _ => false,
    }
}

fn inline_types_match(a: &Schema, b: &Schema) -> bool {
    if a.primary_type() != b.primary_type() || a.is_binary() != b.is_binary() {
        return false;
    }
    if a.is_array() {
        return element_signature(a.items.as_deref()) == element_signature(b.items.as_deref());
    }
    true
}

/// Media type on the other side to compare against: same content type, else the
/// wildcard, else the first declared one.
fn counterpart<'a>(
    content_type: &str,
    other: &'a IndexMap<String, MediaType>,
) -> Option<&'a MediaType> {
    other
        .get(content_type)
        .or_else(|| other.get(WILDCARD_CONTENT_TYPE))
        .or_else(|| other.values().next())
}
