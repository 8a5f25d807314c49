//! # Schema Flattening
//!
//! Converts a possibly cyclic, `$ref`-laden schema graph into a flat multiset of
//! `field:type` keys with occurrence counts.
//!
//! - `$ref` targets are inlined into the parent's namespace (no prefix).
//! - Inline objects are flattened the same way.
//! - Arrays collapse to a single `field:array.<Element>` signature.
//! - Only primitive leaves (`string`, `integer`, `number`, `boolean`) are counted.
//!
//! Cycles are broken with an explicit `visited` set of schema names: a schema
//! that reappears in its own resolution chain contributes nothing.

use crate::refs::schema_ref_name;
use crate::schema::model::{Schema, SchemaMap};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Occurrence counts keyed by `field:type`.
pub type TypeCounts = BTreeMap<String, usize>;

/// Flattened counts of every named schema of one document.
pub type FlattenedSchemas = HashMap<String, TypeCounts>;

/// Pseudo field name used for a top-level primitive schema.
pub const SELF_FIELD: &str = "$self";

/// Pseudo field name used for a top-level array schema.
pub const ITEMS_FIELD: &str = "items";

const PRIMITIVE_TYPES: [&str; 4] = ["string", "integer", "number", "boolean"];

/// Flattens schemas of one document against its named schema table.
pub struct SchemaFlattener<'a> {
    schemas: &'a SchemaMap,
}

impl<'a> SchemaFlattener<'a> {
    /// Creates a flattener resolving `$ref`s against `schemas`.
    pub fn new(schemas: &'a SchemaMap) -> Self {
        Self { schemas }
    }

    /// Flattens `schema`, registered as `name`, tracking the resolution chain in `visited`.
    ///
    /// Returns empty counts for a missing schema or when `name` is already being resolved.
    /// `name` is removed from `visited` again before returning, so sibling references to the
    /// same schema are each flattened in full.
    pub fn flatten(
        &self,
        name: &str,
        schema: Option<&Schema>,
        visited: &mut HashSet<String>,
    ) -> TypeCounts {
        let Some(schema) = schema else {
            return TypeCounts::new();
        };
        if !visited.insert(name.to_string()) {
            return TypeCounts::new();
        }

        let counts = self.flatten_node(schema, visited);

        visited.remove(name);
        counts
    }

    /// Flattens the named schema from the table.
    pub fn flatten_named(&self, name: &str) -> TypeCounts {
        self.flatten(name, self.schemas.get(name), &mut HashSet::new())
    }

    /// Flattens every schema of the table independently.
    pub fn flatten_all(&self) -> FlattenedSchemas {
        self.schemas
            .keys()
            .map(|name| (name.clone(), self.flatten_named(name)))
            .collect()
    }

    fn flatten_node(&self, schema: &Schema, visited: &mut HashSet<String>) -> TypeCounts {
        let mut counts = TypeCounts::new();
        let mut resolve = |target: &str| self.flatten(target, self.schemas.get(target), visited);

        if let Some(reference) = schema.reference.as_deref() {
            return match schema_ref_name(reference) {
                Some(target) => resolve(&target),
                None => counts,
            };
        }

        if let Some(props) = schema.properties.as_ref().filter(|p| !p.is_empty()) {
            for (prop_name, prop) in props {
                count_field(prop_name, prop, &mut resolve, &mut counts);
            }
        } else if schema.is_array() {
            increment(&mut counts, array_key(ITEMS_FIELD, schema.items.as_deref()));
        } else if let Some(key) = primitive_key(SELF_FIELD, schema) {
            increment(&mut counts, key);
        }

        counts
    }
}

/// Counts one named field into `counts`, following the flattening rules.
///
/// `resolve` produces the counts of a referenced component schema; the flattener
/// recurses through it, the request comparator reads a precomputed table.
pub(crate) fn count_field<R>(
    name: &str,
    schema: &Schema,
    resolve: &mut R,
    counts: &mut TypeCounts,
) where
    R: FnMut(&str) -> TypeCounts,
{
    if let Some(reference) = schema.reference.as_deref() {
        if let Some(target) = schema_ref_name(reference) {
            merge_counts(counts, resolve(&target));
        }
        return;
    }

    if schema.is_array() {
        increment(counts, array_key(name, schema.items.as_deref()));
        return;
    }

    if let Some(props) = schema.properties.as_ref().filter(|p| !p.is_empty()) {
        for (prop_name, prop) in props {
            count_field(prop_name, prop, resolve, counts);
        }
        return;
    }

    if let Some(key) = primitive_key(name, schema) {
        increment(counts, key);
    }
}

/// Shape signature of an array's element: the referenced schema name or the element type.
pub(crate) fn element_signature(items: Option<&Schema>) -> String {
    let Some(items) = items else {
        return "object".to_string();
    };
    if let Some(reference) = items.reference.as_deref() {
        return schema_ref_name(reference).unwrap_or_else(|| {
            reference
                .rsplit('/')
                .next()
                .unwrap_or(reference)
                .to_string()
        });
    }
    if items.is_array() {
        return "array".to_string();
    }
    match items.primary_type() {
        Some("string") if items.is_binary() => "binary".to_string(),
        Some(t) if is_primitive(t) => t.to_string(),
        _ => "object".to_string(),
    }
}

/// True for the four counted leaf types.
pub fn is_primitive(type_name: &str) -> bool {
    PRIMITIVE_TYPES.contains(&type_name)
}

/// Adds every count of `other` into `target`.
pub fn merge_counts(target: &mut TypeCounts, other: TypeCounts) {
    for (key, count) in other {
        *target.entry(key).or_insert(0) += count;
    }
}

fn increment(counts: &mut TypeCounts, key: String) {
    *counts.entry(key).or_insert(0) += 1;
}

fn array_key(name: &str, items: Option<&Schema>) -> String {
    format!("{}:array.{}", name, element_signature(items))
}

fn primitive_key(name: &str, schema: &Schema) -> Option<String> {
    let type_name = schema.primary_type().filter(|t| is_primitive(t))?;
    if schema.is_binary() {
        Some(format!("{}:binary", name))
    } else {
        Some(format!("{}:{}", name, type_name))
    }
}
