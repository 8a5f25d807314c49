//! # Schema Model
//!
//! A typed view of a JSON Schema node as used in `components.schemas`,
//! parameters, bodies and message payloads. Keys the model does not know
//! about are kept in `extra` and written back untouched.

use crate::refs::schema_ref_name;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named schemas, keyed by component name.
pub type SchemaMap = IndexMap<String, Schema>;

/// The `type` keyword: a single name, or an OpenAPI 3.1 type array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    /// `type: string`
    Single(String),
    /// `type: [string, "null"]`
    Multiple(Vec<String>),
}

impl SchemaType {
    /// The first non-`null` type name.
    pub fn primary(&self) -> Option<&str> {
        match self {
            SchemaType::Single(name) => Some(name.as_str()),
            SchemaType::Multiple(names) => names
                .iter()
                .map(String::as_str)
                .find(|name| *name != "null"),
        }
    }
}

/// A schema node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// `$ref` pointer, when this node is a reference.
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Declared type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    /// Declared format (`binary`, `int64`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Human description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Object properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    /// Array element schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Required property names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Property display order.
    #[serde(
        rename = "x-ouroboros-orders",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub orders: Option<Vec<String>>,
    /// Everything else (`enum`, `example`, `x-ouroboros-mock`, ...).
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Schema {
    /// A `$ref` to `#/components/schemas/{name}`.
    pub fn reference_to(name: &str) -> Self {
        Schema {
            reference: Some(crate::refs::schema_ref(name)),
            ..Default::default()
        }
    }

    /// An inline node of the given type.
    pub fn of_type(type_name: &str) -> Self {
        Schema {
            schema_type: Some(SchemaType::Single(type_name.to_string())),
            ..Default::default()
        }
    }

    /// An inline object with the given properties.
    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Schema {
            schema_type: Some(SchemaType::Single("object".to_string())),
            properties: Some(
                properties
                    .into_iter()
                    .map(|(name, schema)| (name.into(), schema))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    /// An inline array of `items`.
    pub fn array_of(items: Schema) -> Self {
        Schema {
            schema_type: Some(SchemaType::Single("array".to_string())),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// Builder helper setting `format`.
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    /// Primary declared type, ignoring `null`.
    pub fn primary_type(&self) -> Option<&str> {
        self.schema_type.as_ref().and_then(SchemaType::primary)
    }

    /// Name of the referenced component schema, if this node is a local `$ref`.
    pub fn ref_name(&self) -> Option<String> {
        self.reference.as_deref().and_then(schema_ref_name)
    }

    /// True when the node declares `type: array` or carries `items`.
    pub fn is_array(&self) -> bool {
        self.primary_type() == Some("array")
            || (self.schema_type.is_none() && self.items.is_some())
    }

    /// True for `format: binary`.
    pub fn is_binary(&self) -> bool {
        self.format.as_deref() == Some("binary")
    }

    /// True when the node has inline properties.
    pub fn has_properties(&self) -> bool {
        self.properties.as_ref().is_some_and(|p| !p.is_empty())
    }

    /// Rewrites every `$ref` in this node and its children through `rewrite`.
    pub fn rewrite_refs<F>(&mut self, rewrite: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(new_ref) = self.reference.as_deref().and_then(rewrite) {
            self.reference = Some(new_ref);
        }
        if let Some(props) = self.properties.as_mut() {
            for prop in props.values_mut() {
                prop.rewrite_refs(rewrite);
            }
        }
        if let Some(items) = self.items.as_mut() {
            items.rewrite_refs(rewrite);
        }
        for value in self.extra.values_mut() {
            rewrite_value_refs(value, rewrite);
        }
    }
}

/// Rewrites every `"$ref"` string inside a free-form JSON value.
pub fn rewrite_value_refs<F>(value: &mut Value, rewrite: &F)
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if key == "$ref" {
                    if let Some(new_ref) = v.as_str().and_then(rewrite) {
                        *v = Value::String(new_ref);
                    }
                } else {
                    rewrite_value_refs(v, rewrite);
                }
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                rewrite_value_refs(v, rewrite);
            }
        }
        _ => {}
    }
}
