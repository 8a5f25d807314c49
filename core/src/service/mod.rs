//! # Specification Services
//!
//! The operations exposed to callers (HTTP controllers, the CLI). Each public
//! method is exactly one critical section on the underlying [`SpecStore`]:
//! lookups take the shared lock, mutations the exclusive one. Inputs are
//! validated before the document is touched.
//!
//! Entities cross this boundary in the JSON view (`ref`, unprefixed markers).
//!
//! [`SpecStore`]: crate::store::SpecStore

pub mod rest;
pub mod ws;

pub use rest::RestSpecService;
pub use ws::WsSpecService;

use crate::error::{AppError, AppResult};
use crate::json_view::{from_api_json, to_api_json};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Renders an entity in the JSON view.
pub(crate) fn to_view<T: Serialize>(item: &T) -> AppResult<Value> {
    Ok(to_api_json(&serde_json::to_value(item)?))
}

/// Parses an entity given in the JSON view.
pub(crate) fn from_view<T: DeserializeOwned>(kind: &str, value: &Value) -> AppResult<T> {
    serde_json::from_value(from_api_json(value))
        .map_err(|e| AppError::InvalidInput(format!("invalid {}: {}", kind, e)))
}

/// Renders a whole named collection in the JSON view.
pub(crate) fn map_view<T: Serialize>(map: &IndexMap<String, T>) -> AppResult<Value> {
    let mut out = Map::new();
    for (name, item) in map {
        out.insert(name.clone(), to_view(item)?);
    }
    Ok(Value::Object(out))
}

pub(crate) fn lookup<'a, T>(
    map: &'a IndexMap<String, T>,
    kind: &'static str,
    name: &str,
) -> AppResult<&'a T> {
    map.get(name).ok_or_else(|| AppError::not_found(kind, name))
}

pub(crate) fn insert_new<T>(
    map: &mut IndexMap<String, T>,
    kind: &'static str,
    name: &str,
    item: T,
) -> AppResult<()> {
    if map.contains_key(name) {
        return Err(AppError::duplicate(kind, name));
    }
    map.insert(name.to_string(), item);
    Ok(())
}

pub(crate) fn replace_existing<T>(
    map: &mut IndexMap<String, T>,
    kind: &'static str,
    name: &str,
    item: T,
) -> AppResult<()> {
    match map.get_mut(name) {
        Some(slot) => {
            *slot = item;
            Ok(())
        }
        None => Err(AppError::not_found(kind, name)),
    }
}

pub(crate) fn remove_existing<T>(
    map: &mut IndexMap<String, T>,
    kind: &'static str,
    name: &str,
) -> AppResult<T> {
    map.shift_remove(name)
        .ok_or_else(|| AppError::not_found(kind, name))
}
