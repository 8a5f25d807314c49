//! # JSON View
//!
//! Converts between the persisted document convention (`$ref`, `x-ouroboros-*`)
//! and the JSON convention exposed to API consumers (`ref`, unprefixed markers).
//!
//! Keys directly inside a `properties` map are field names and are never rewritten,
//! so a schema may legitimately have a field called `ref` or `id`. Values of the
//! free-form keywords (`example`, `default`, `enum`, `const`, the mock marker and
//! each `examples` entry's `value`) are user data and are copied verbatim.

use crate::extensions::EXTENSION_PREFIX;
use serde_json::{Map, Value};

/// Marker names that lose their prefix in the JSON view.
pub const KNOWN_EXTENSIONS: [&str; 9] = [
    "id",
    "diff",
    "progress",
    "tag",
    "orders",
    "entrypoint",
    "mock",
    "diff-log",
    "response",
];

const YAML_REF: &str = "$ref";
const JSON_REF: &str = "ref";
const PROPERTIES: &str = "properties";
const EXAMPLES: &str = "examples";
const EXAMPLE_VALUE: &str = "value";

/// Keywords whose values are opaque user data.
const FREE_FORM: [&str; 4] = ["example", "default", "enum", "const"];
const MOCK: &str = "mock";

/// Persisted form → API form.
pub fn to_api_json(value: &Value) -> Value {
    convert(value, &|key| {
        if key == YAML_REF {
            JSON_REF.to_string()
        } else {
            key.strip_prefix(EXTENSION_PREFIX).unwrap_or(key).to_string()
        }
    })
}

/// API form → persisted form.
pub fn from_api_json(value: &Value) -> Value {
    convert(value, &|key| {
        if key == JSON_REF {
            YAML_REF.to_string()
        } else if KNOWN_EXTENSIONS.contains(&key) {
            format!("{}{}", EXTENSION_PREFIX, key)
        } else {
            key.to_string()
        }
    })
}

fn convert<F>(value: &Value, rename: &F) -> Value
where
    F: Fn(&str) -> String,
{
    match value {
        Value::Object(map) => Value::Object(convert_map(map, rename)),
        Value::Array(items) => Value::Array(items.iter().map(|v| convert(v, rename)).collect()),
        other => other.clone(),
    }
}

fn convert_map<F>(map: &Map<String, Value>, rename: &F) -> Map<String, Value>
where
    F: Fn(&str) -> String,
{
    map.iter()
        .map(|(key, v)| {
            let converted = match (key.as_str(), v) {
                (PROPERTIES, Value::Object(fields)) => Value::Object(
                    fields
                        .iter()
                        .map(|(field, schema)| (field.clone(), convert(schema, rename)))
                        .collect(),
                ),
                (EXAMPLES, Value::Object(entries)) => Value::Object(
                    entries
                        .iter()
                        .map(|(name, example)| (name.clone(), convert_example(example, rename)))
                        .collect(),
                ),
                _ if is_free_form(key) => v.clone(),
                _ => convert(v, rename),
            };
            (rename(key), converted)
        })
        .collect()
}

/// An OpenAPI Example object: its own keys are structural, its `value` is not.
fn convert_example<F>(example: &Value, rename: &F) -> Value
where
    F: Fn(&str) -> String,
{
    match example {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, v)| {
                    let converted = if key == EXAMPLE_VALUE {
                        v.clone()
                    } else {
                        convert(v, rename)
                    };
                    (rename(key), converted)
                })
                .collect(),
        ),
        // JSON Schema `examples` is a plain array of values.
        other => other.clone(),
    }
}

fn is_free_form(key: &str) -> bool {
    let bare = key.strip_prefix(EXTENSION_PREFIX).unwrap_or(key);
    FREE_FORM.contains(&key) || bare == MOCK
}
