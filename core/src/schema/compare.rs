//! # Schema Comparison
//!
//! Decides per named schema whether the scanned and file definitions are
//! structurally equivalent, by comparing their flattened `TypeCounts`.

use crate::schema::flatten::{FlattenedSchemas, SchemaFlattener, TypeCounts};
use crate::schema::model::SchemaMap;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;

/// One key whose count differs between the file (spec) and the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountDelta {
    /// Observed in the scan, absent from the file.
    MissingFromSpec {
        /// The `field:type` key.
        key: String,
        /// Count in the scan.
        scan: usize,
    },
    /// Declared in the file, absent from the scan.
    NotObservedInScan {
        /// The `field:type` key.
        key: String,
        /// Count in the file.
        spec: usize,
    },
    /// Present on both sides with different counts.
    CountDiffers {
        /// The `field:type` key.
        key: String,
        /// Count in the file.
        spec: usize,
        /// Count in the scan.
        scan: usize,
    },
}

impl Display for CountDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CountDelta::MissingFromSpec { key, scan } => {
                write!(f, "{} missing from spec (scan={})", key, scan)
            }
            CountDelta::NotObservedInScan { key, spec } => {
                write!(f, "{} not observed in scan (spec={})", key, spec)
            }
            CountDelta::CountDiffers { key, spec, scan } => {
                write!(f, "{} count differs spec={} scan={}", key, spec, scan)
            }
        }
    }
}

/// Compares two count maps over the union of their keys. A missing key counts as 0.
pub fn count_deltas(spec: &TypeCounts, scan: &TypeCounts) -> Vec<CountDelta> {
    let keys: BTreeSet<&String> = spec.keys().chain(scan.keys()).collect();
    keys.into_iter()
        .filter_map(|key| {
            let spec_count = spec.get(key).copied().unwrap_or(0);
            let scan_count = scan.get(key).copied().unwrap_or(0);
            match (spec_count, scan_count) {
                (a, b) if a == b => None,
                (0, scan) => Some(CountDelta::MissingFromSpec {
                    key: key.clone(),
                    scan,
                }),
                (spec, 0) => Some(CountDelta::NotObservedInScan {
                    key: key.clone(),
                    spec,
                }),
                (spec, scan) => Some(CountDelta::CountDiffers {
                    key: key.clone(),
                    spec,
                    scan,
                }),
            }
        })
        .collect()
}

/// True when both maps hold the same count for every key.
pub fn counts_equal(spec: &TypeCounts, scan: &TypeCounts) -> bool {
    count_deltas(spec, scan).is_empty()
}

/// Per-schema equivalence results of one comparison pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaMatchReport {
    /// Results keyed by scan-side schema names.
    pub scan_results: IndexMap<String, bool>,
    /// Results keyed by file-side schema names.
    pub file_results: IndexMap<String, bool>,
    scan_flat: FlattenedSchemas,
    file_flat: FlattenedSchemas,
}

impl SchemaMatchReport {
    /// Merged view; the scan side wins on name collisions.
    pub fn merged(&self) -> HashMap<String, bool> {
        let mut merged: HashMap<String, bool> = self.file_results.clone().into_iter().collect();
        merged.extend(self.scan_results.iter().map(|(k, v)| (k.clone(), *v)));
        merged
    }

    /// Whether `name` is equivalent on both sides.
    pub fn is_same(&self, name: &str) -> bool {
        self.scan_results
            .get(name)
            .or_else(|| self.file_results.get(name))
            .copied()
            .unwrap_or(false)
    }

    /// Boolean view: every schema on both sides is equivalent.
    pub fn all_same(&self) -> bool {
        self.scan_results.values().chain(self.file_results.values()).all(|same| *same)
    }

    /// Structured per-field detail for one schema, file side as "spec".
    pub fn schema_deltas(&self, name: &str) -> Vec<CountDelta> {
        let empty = TypeCounts::new();
        let spec = self.file_flat.get(name).unwrap_or(&empty);
        let scan = self.scan_flat.get(name).unwrap_or(&empty);
        count_deltas(spec, scan)
    }

    /// Flattened scan-side schemas computed for this pass.
    pub fn scan_flattened(&self) -> &FlattenedSchemas {
        &self.scan_flat
    }

    /// Flattened file-side schemas computed for this pass.
    pub fn file_flattened(&self) -> &FlattenedSchemas {
        &self.file_flat
    }
}

/// Flattens both schema tables and compares them name by name.
///
/// A schema present on only one side is reported as not same on that side.
pub fn compare_schemas(scan: &SchemaMap, file: &SchemaMap) -> SchemaMatchReport {
    let scan_flat = SchemaFlattener::new(scan).flatten_all();
    let file_flat = SchemaFlattener::new(file).flatten_all();

    let scan_results = side_results(scan, &scan_flat, &file_flat);
    let file_results = side_results(file, &file_flat, &scan_flat);

    SchemaMatchReport {
        scan_results,
        file_results,
        scan_flat,
        file_flat,
    }
}

fn side_results(
    own: &SchemaMap,
    own_flat: &FlattenedSchemas,
    other_flat: &FlattenedSchemas,
) -> IndexMap<String, bool> {
    own.keys()
        .map(|name| {
            let same = match (own_flat.get(name), other_flat.get(name)) {
                (Some(mine), Some(theirs)) => counts_equal(mine, theirs),
                _ => false,
            };
            (name.clone(), same)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::model::Schema;
    use pretty_assertions::assert_eq;

    fn user(fields: &[(&str, &str)]) -> SchemaMap {
        let mut map = SchemaMap::new();
        map.insert(
            "User".to_string(),
            Schema::object(fields.iter().map(|(n, t)| (*n, Schema::of_type(t)))),
        );
        map
    }

    #[test]
    fn test_identical_shape_is_same() {
        let scan = user(&[("id", "integer"), ("name", "string")]);
        let file = user(&[("name", "string"), ("id", "integer")]);
        let report = compare_schemas(&scan, &file);
        assert!(report.is_same("User"));
        assert!(report.all_same());
    }

    #[test]
    fn test_added_removed_or_retyped_field_flips_result() {
        let base = user(&[("id", "integer"), ("name", "string")]);
        for variant in [
            user(&[("id", "integer"), ("name", "string"), ("age", "integer")]),
            user(&[("id", "integer")]),
            user(&[("id", "string"), ("name", "string")]),
        ] {
            let report = compare_schemas(&variant, &base);
            assert!(!report.is_same("User"));
            assert!(!report.all_same());
        }
    }

    #[test]
    fn test_one_sided_schema_is_not_same() {
        let mut scan = user(&[("id", "integer")]);
        scan.insert("Extra".into(), Schema::object([("x", Schema::of_type("string"))]));
        let file = user(&[("id", "integer")]);
        let report = compare_schemas(&scan, &file);
        assert_eq!(report.scan_results.get("Extra"), Some(&false));
        assert!(!report.file_results.contains_key("Extra"));
        assert_eq!(report.merged().get("User"), Some(&true));
    }

    #[test]
    fn test_deltas_describe_each_key() {
        let scan = user(&[("id", "integer"), ("email", "string")]);
        let file = user(&[("id", "integer"), ("name", "boolean")]);
        let report = compare_schemas(&scan, &file);
        let rendered: Vec<String> = report
            .schema_deltas("User")
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            rendered,
            vec![
                "email:string missing from spec (scan=1)".to_string(),
                "name:boolean not observed in scan (spec=1)".to_string(),
            ]
        );
    }

    #[test]
    fn test_count_differs_delta() {
        let spec: TypeCounts = [("road:string".to_string(), 1)].into_iter().collect();
        let scan: TypeCounts = [("road:string".to_string(), 2)].into_iter().collect();
        assert_eq!(
            count_deltas(&spec, &scan),
            vec![CountDelta::CountDiffers {
                key: "road:string".into(),
                spec: 1,
                scan: 2
            }]
        );
    }
}
