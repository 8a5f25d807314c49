//! # OpenAPI Document
//!
//! Typed view of the persisted REST specification. Only the parts the
//! reconciliation engine reasons about are typed; everything else (info,
//! servers, headers, examples, unknown extensions) is carried verbatim.

use crate::extensions::{Diff, Progress, RESPONSE_USE};
use crate::oas::methods::HttpMethod;
use crate::schema::{Schema, SchemaMap};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// OpenAPI version written into new documents.
pub const OPENAPI_VERSION: &str = "3.1.0";

/// The whole REST specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestApiSpec {
    /// `openapi` version string.
    #[serde(default = "default_openapi_version")]
    pub openapi: String,
    /// `info` object.
    #[serde(default)]
    pub info: Value,
    /// `servers` list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Value>,
    /// Path items keyed by path template.
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
    /// Reusable components.
    #[serde(default)]
    pub components: Components,
    /// Top-level security requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Value>,
    /// Other top-level keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

fn default_openapi_version() -> String {
    OPENAPI_VERSION.to_string()
}

impl Default for RestApiSpec {
    fn default() -> Self {
        Self {
            openapi: default_openapi_version(),
            info: json!({ "title": "Ouroboros API", "version": "v1" }),
            servers: Vec::new(),
            paths: IndexMap::new(),
            components: Components::default(),
            security: None,
            extra: IndexMap::new(),
        }
    }
}

impl RestApiSpec {
    /// Operation at `path` + `method`.
    pub fn operation(&self, path: &str, method: HttpMethod) -> Option<&Operation> {
        self.paths.get(path).and_then(|item| item.operation(method))
    }

    /// Mutable operation at `path` + `method`.
    pub fn operation_mut(&mut self, path: &str, method: HttpMethod) -> Option<&mut Operation> {
        self.paths
            .get_mut(path)
            .and_then(|item| item.operation_mut(method))
    }

    /// Finds an operation by its `x-ouroboros-id`.
    pub fn find_by_id(&self, id: &str) -> Option<(&str, HttpMethod, &Operation)> {
        self.paths.iter().find_map(|(path, item)| {
            item.operations()
                .find(|(_, op)| op.id.as_deref() == Some(id))
                .map(|(method, op)| (path.as_str(), method, op))
        })
    }

    /// Every `(path, method, operation)` triple in document order.
    pub fn operations(&self) -> impl Iterator<Item = (&str, HttpMethod, &Operation)> {
        self.paths.iter().flat_map(|(path, item)| {
            item.operations()
                .map(move |(method, op)| (path.as_str(), method, op))
        })
    }
}

/// A path item with one slot per reconciled method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// GET operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// POST operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// PUT operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// PATCH operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// DELETE operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// `summary`, shared `parameters`, other methods, extensions.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl PathItem {
    /// Operation for `method`.
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        self.slot(method).as_ref()
    }

    /// Mutable operation for `method`.
    pub fn operation_mut(&mut self, method: HttpMethod) -> Option<&mut Operation> {
        self.slot_mut(method).as_mut()
    }

    /// Replaces the slot for `method`, returning the previous operation.
    pub fn set_operation(
        &mut self,
        method: HttpMethod,
        op: Option<Operation>,
    ) -> Option<Operation> {
        std::mem::replace(self.slot_mut(method), op)
    }

    /// Present operations in method order.
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        HttpMethod::ALL
            .into_iter()
            .filter_map(move |method| self.operation(method).map(|op| (method, op)))
    }

    /// True when none of the five method slots is filled.
    pub fn has_no_operations(&self) -> bool {
        HttpMethod::ALL
            .iter()
            .all(|method| self.operation(*method).is_none())
    }

    fn slot(&self, method: HttpMethod) -> &Option<Operation> {
        match method {
            HttpMethod::Get => &self.get,
            HttpMethod::Post => &self.post,
            HttpMethod::Put => &self.put,
            HttpMethod::Patch => &self.patch,
            HttpMethod::Delete => &self.delete,
        }
    }

    fn slot_mut(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Delete => &mut self.delete,
        }
    }
}

/// One HTTP operation plus its reconciliation markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Long description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Grouping tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// `operationId`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Query, header, cookie and path parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status code.
    #[serde(default)]
    pub responses: IndexMap<String, ApiResponse>,
    /// Stable id used for external addressing.
    #[serde(rename = "x-ouroboros-id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Implementation maturity.
    #[serde(rename = "x-ouroboros-progress", default)]
    pub progress: Progress,
    /// Free-form tag, reset on request drift.
    #[serde(rename = "x-ouroboros-tag", default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Drift marker.
    #[serde(rename = "x-ouroboros-diff", default)]
    pub diff: Diff,
    /// Description of the last request mismatch.
    #[serde(
        rename = "x-ouroboros-diff-log",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub diff_log: Option<String>,
    /// Scanned-side opt-in for response comparison.
    #[serde(
        rename = "x-ouroboros-response",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub response_marker: Option<String>,
    /// `security`, `deprecated`, `x-ouroboros-mock`, ...
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Operation {
    /// True when the scanner declared response shapes explicitly.
    pub fn uses_declared_responses(&self) -> bool {
        self.response_marker.as_deref() == Some(RESPONSE_USE)
    }
}

/// An operation parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Location: `query`, `header`, `path`, `cookie`.
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Whether the parameter is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Human description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parameter schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    /// Other keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Parameter {
    /// True for `in: path`.
    pub fn is_path(&self) -> bool {
        self.location.as_deref() == Some("path")
    }
}

/// A request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Human description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the body is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Media types keyed by content type.
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
    /// Other keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A media type entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Payload schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    /// `example`, `examples`, `encoding`, ...
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl MediaType {
    /// Media type holding `schema`.
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema: Some(schema),
            extra: IndexMap::new(),
        }
    }
}

/// A response for one status code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Required description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Media types keyed by content type.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
    /// `headers`, `links`, ...
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// The `components` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    /// Named schemas.
    #[serde(default)]
    pub schemas: SchemaMap,
    /// Security schemes, which the scanner cannot observe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_schemes: Option<IndexMap<String, Value>>,
    /// `parameters`, `responses`, `examples`, ...
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}
