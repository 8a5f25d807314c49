//! REST specification service.

use crate::error::{AppError, AppResult};
use crate::oas::document::{Operation, RestApiSpec};
use crate::oas::methods::HttpMethod;
use crate::oas::sync::{synchronize, Scanner, SyncReport};
use crate::schema::Schema;
use crate::service::{
    from_view, insert_new, lookup, map_view, remove_existing, replace_existing, to_view,
};
use crate::store::SpecStore;
use serde_json::{json, Value};
use std::path::PathBuf;

/// Schema and operation access plus reconciliation for the REST document.
pub struct RestSpecService {
    store: SpecStore<RestApiSpec>,
}

impl RestSpecService {
    /// Service over the document at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            store: SpecStore::open(path),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &SpecStore<RestApiSpec> {
        &self.store
    }

    /// All component schemas, keyed by name.
    pub fn list_schemas(&self) -> AppResult<Value> {
        self.store.read(|doc| map_view(&doc.components.schemas))
    }

    /// One component schema.
    pub fn get_schema(&self, name: &str) -> AppResult<Value> {
        self.store
            .read(|doc| to_view(lookup(&doc.components.schemas, "schema", name)?))
    }

    /// Adds a schema; fails if the name is taken.
    pub fn create_schema(&self, name: &str, schema: &Value) -> AppResult<()> {
        let schema: Schema = from_view("schema", schema)?;
        self.store
            .write(|doc| insert_new(&mut doc.components.schemas, "schema", name, schema))
    }

    /// Replaces an existing schema.
    pub fn update_schema(&self, name: &str, schema: &Value) -> AppResult<()> {
        let schema: Schema = from_view("schema", schema)?;
        self.store
            .write(|doc| replace_existing(&mut doc.components.schemas, "schema", name, schema))
    }

    /// Removes a schema.
    pub fn delete_schema(&self, name: &str) -> AppResult<()> {
        self.store.write(|doc| {
            remove_existing(&mut doc.components.schemas, "schema", name).map(|_| ())
        })
    }

    /// Every operation in the JSON view, annotated with its path and method.
    pub fn list_operations(&self) -> AppResult<Vec<Value>> {
        self.store.read(|doc| {
            doc.operations()
                .map(|(path, method, op)| operation_view(path, method, op))
                .collect()
        })
    }

    /// One operation by its `x-ouroboros-id`.
    pub fn get_operation(&self, id: &str) -> AppResult<Value> {
        self.store.read(|doc| match doc.find_by_id(id) {
            Some((path, method, op)) => operation_view(path, method, op),
            None => Err(AppError::not_found("operation", id)),
        })
    }

    /// Runs one reconciliation pass against a fresh scan.
    ///
    /// A scan or parse failure aborts the pass and leaves the file untouched.
    pub fn reconcile<S: Scanner + ?Sized>(&self, scanner: &S) -> AppResult<SyncReport> {
        let scanned = scanner.scan().inspect_err(|e| {
            log::warn!("Reconciliation skipped, scan failed: {}", e);
        })?;
        self.store
            .write(|doc| Ok(synchronize(doc, &scanned)))
            .inspect_err(|e| {
                log::warn!(
                    "Reconciliation of {} aborted: {}",
                    self.store.path().display(),
                    e
                );
            })
    }
}

fn operation_view(path: &str, method: HttpMethod, op: &Operation) -> AppResult<Value> {
    let mut view = to_view(op)?;
    if let Some(map) = view.as_object_mut() {
        map.insert("path".into(), json!(path));
        map.insert("method".into(), json!(method.to_string()));
    }
    Ok(view)
}
