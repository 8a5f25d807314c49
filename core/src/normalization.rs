//! # Document Normalization
//!
//! Self-healing applied to a raw document before it is deserialized into the
//! typed model. Required sections that are absent or `null` are replaced with
//! empty structures; the caller decides whether to persist the repair.

use serde_json::{json, Map, Value};

/// Fills required sections of an OpenAPI document.
///
/// Returns the dotted names of the sections that were repaired.
pub(crate) fn heal_rest_document(value: &mut Value) -> Vec<String> {
    let mut repaired = Vec::new();
    let Some(root) = ensure_root(value, &mut repaired) else {
        return repaired;
    };

    ensure_entry(root, "openapi", json!("3.1.0"), &mut repaired);
    ensure_entry(root, "info", default_info(), &mut repaired);
    ensure_map(root, "paths", "paths", &mut repaired);

    if let Some(components) = ensure_map(root, "components", "components", &mut repaired) {
        ensure_map(components, "schemas", "components.schemas", &mut repaired);
    }

    if let Some(paths) = root.get_mut("paths").and_then(Value::as_object_mut) {
        let before = paths.len();
        paths.retain(|_, item| !item.is_null());
        if paths.len() != before {
            repaired.push("paths.<null item>".to_string());
        }
    }

    repaired
}

/// Fills required sections of an AsyncAPI document.
///
/// Returns the dotted names of the sections that were repaired.
pub(crate) fn heal_async_document(value: &mut Value) -> Vec<String> {
    let mut repaired = Vec::new();
    let Some(root) = ensure_root(value, &mut repaired) else {
        return repaired;
    };

    ensure_entry(root, "asyncapi", json!("3.0.0"), &mut repaired);
    ensure_entry(root, "info", default_info(), &mut repaired);
    ensure_map(root, "servers", "servers", &mut repaired);
    ensure_map(root, "channels", "channels", &mut repaired);
    ensure_map(root, "operations", "operations", &mut repaired);

    if let Some(components) = ensure_map(root, "components", "components", &mut repaired) {
        ensure_map(components, "schemas", "components.schemas", &mut repaired);
        ensure_map(components, "messages", "components.messages", &mut repaired);
    }

    repaired
}

fn default_info() -> Value {
    json!({ "title": "Ouroboros API", "version": "v1" })
}

fn ensure_root<'a>(
    value: &'a mut Value,
    repaired: &mut Vec<String>,
) -> Option<&'a mut Map<String, Value>> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
        repaired.push("<root>".to_string());
    }
    value.as_object_mut()
}

fn ensure_entry(
    map: &mut Map<String, Value>,
    key: &str,
    default: Value,
    repaired: &mut Vec<String>,
) {
    if map.get(key).map_or(true, Value::is_null) {
        map.insert(key.to_string(), default);
        repaired.push(key.to_string());
    }
}

fn ensure_map<'a>(
    map: &'a mut Map<String, Value>,
    key: &str,
    label: &str,
    repaired: &mut Vec<String>,
) -> Option<&'a mut Map<String, Value>> {
    if !map.get(key).is_some_and(Value::is_object) {
        map.insert(key.to_string(), Value::Object(Map::new()));
        repaired.push(label.to_string());
    }
    map.get_mut(key).and_then(Value::as_object_mut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rest_fills_missing_sections() {
        let mut doc = json!({
            "openapi": "3.1.0",
            "info": { "title": "t", "version": "1" },
            "components": null
        });
        let repaired = heal_rest_document(&mut doc);
        assert_eq!(repaired, vec!["paths", "components", "components.schemas"]);
        assert!(doc["paths"].is_object());
        assert!(doc["components"]["schemas"].is_object());
    }

    #[test]
    fn test_rest_complete_document_untouched() {
        let mut doc = json!({
            "openapi": "3.1.0",
            "info": { "title": "t", "version": "1" },
            "paths": {},
            "components": { "schemas": {} }
        });
        let original = doc.clone();
        assert!(heal_rest_document(&mut doc).is_empty());
        assert_eq!(doc, original);
    }

    #[test]
    fn test_async_fills_operations_and_messages() {
        let mut doc = json!({
            "asyncapi": "3.0.0",
            "info": { "title": "t", "version": "1" },
            "channels": {},
            "components": { "schemas": {} }
        });
        let repaired = heal_async_document(&mut doc);
        assert_eq!(repaired, vec!["servers", "operations", "components.messages"]);
        assert!(doc["operations"].is_object());
    }

    #[test]
    fn test_empty_document_becomes_skeleton() {
        let mut doc = Value::Null;
        let repaired = heal_async_document(&mut doc);
        assert_eq!(repaired[0], "<root>");
        assert_eq!(doc["asyncapi"], json!("3.0.0"));
    }
}
