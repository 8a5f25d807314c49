//! WebSocket (AsyncAPI) specification service.

use crate::asyncapi::document::{AsyncApiSpec, Message};
use crate::asyncapi::graph::{self, OperationDraft};
use crate::asyncapi::import::{self, ImportOutcome};
use crate::error::{AppError, AppResult};
use crate::schema::Schema;
use crate::service::{
    from_view, insert_new, lookup, map_view, remove_existing, replace_existing, to_view,
};
use crate::store::SpecStore;
use serde_json::{json, Value};
use std::path::PathBuf;

/// Schema, message and operation access plus import for the WebSocket document.
pub struct WsSpecService {
    store: SpecStore<AsyncApiSpec>,
}

impl WsSpecService {
    /// Service over the document at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            store: SpecStore::open(path),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &SpecStore<AsyncApiSpec> {
        &self.store
    }

    /// All payload schemas, keyed by name.
    pub fn list_schemas(&self) -> AppResult<Value> {
        self.store.read(|doc| map_view(&doc.components.schemas))
    }

    /// One payload schema.
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

    /// All messages, keyed by name.
    pub fn list_messages(&self) -> AppResult<Value> {
        self.store.read(|doc| map_view(&doc.components.messages))
    }

    /// One message.
    pub fn get_message(&self, name: &str) -> AppResult<Value> {
        self.store
            .read(|doc| to_view(lookup(&doc.components.messages, "message", name)?))
    }

    /// Adds a message; fails if the name is taken.
    pub fn create_message(&self, name: &str, message: &Value) -> AppResult<()> {
        let message: Message = from_view("message", message)?;
        self.store
            .write(|doc| insert_new(&mut doc.components.messages, "message", name, message))
    }

    /// Replaces an existing message.
    pub fn update_message(&self, name: &str, message: &Value) -> AppResult<()> {
        let message: Message = from_view("message", message)?;
        self.store.write(|doc| {
            replace_existing(&mut doc.components.messages, "message", name, message)
        })
    }

    /// Removes a message no channel or operation refers to anymore.
    pub fn delete_message(&self, name: &str) -> AppResult<()> {
        self.store.write(|doc| {
            lookup(&doc.components.messages, "message", name)?;
            let users = doc.channels_using_message(name);
            if !users.is_empty() {
                return Err(AppError::InvalidInput(format!(
                    "message '{}' is still used by channel(s): {}",
                    name,
                    users.join(", ")
                )));
            }
            let operations: Vec<&str> = doc
                .operations
                .iter()
                .filter(|(_, op)| op.message_names(doc).contains(name))
                .map(|(op_name, _)| op_name.as_str())
                .collect();
            if !operations.is_empty() {
                return Err(AppError::InvalidInput(format!(
                    "message '{}' is still used by operation(s): {}",
                    name,
                    operations.join(", ")
                )));
            }
            remove_existing(&mut doc.components.messages, "message", name).map(|_| ())
        })
    }

    /// Every operation in the JSON view, annotated with its name.
    pub fn list_operations(&self) -> AppResult<Vec<Value>> {
        self.store.read(|doc| {
            doc.operations
                .iter()
                .map(|(name, op)| named_view(name, op))
                .collect()
        })
    }

    /// One operation by name.
    pub fn get_operation(&self, name: &str) -> AppResult<Value> {
        self.store
            .read(|doc| named_view(name, lookup(&doc.operations, "operation", name)?))
    }

    /// One operation by its `x-ouroboros-id`.
    pub fn get_operation_by_id(&self, id: &str) -> AppResult<Value> {
        self.store.read(|doc| {
            let (name, op) = doc
                .find_operation_by_id(id)
                .ok_or_else(|| AppError::not_found("operation", id))?;
            named_view(name, op)
        })
    }

    /// Creates an operation, creating channels and server as needed. Returns its name.
    pub fn create_operation(&self, draft: &OperationDraft) -> AppResult<String> {
        self.store.write(|doc| graph::create_operation(doc, draft))
    }

    /// Re-points an operation; returns the channels removed as orphans.
    pub fn update_operation(&self, name: &str, draft: &OperationDraft) -> AppResult<Vec<String>> {
        self.store
            .write(|doc| graph::update_operation(doc, name, draft))
    }

    /// Deletes an operation; returns the channels removed as orphans.
    pub fn delete_operation(&self, name: &str) -> AppResult<Vec<String>> {
        self.store
            .write(|doc| graph::delete_operation(doc, name).map(|(_, removed)| removed))
    }

    /// Merges an uploaded AsyncAPI YAML document.
    ///
    /// The upload is validated before the lock is taken, so a rejected upload
    /// never touches the persisted document.
    pub fn import_yaml(&self, file_name: &str, content: &str) -> AppResult<ImportOutcome> {
        let imported = import::parse_import(file_name, content)?;
        let outcome = self
            .store
            .write(|doc| Ok(import::merge_document(doc, imported)))?;
        log::info!(
            "Imported {} item(s) from '{}', {} renamed",
            outcome.imported,
            file_name,
            outcome.renamed.len()
        );
        Ok(outcome)
    }
}

fn named_view<T: serde::Serialize>(name: &str, item: &T) -> AppResult<Value> {
    let mut view = to_view(item)?;
    if let Some(map) = view.as_object_mut() {
        map.insert("name".into(), json!(name));
    }
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asyncapi::graph::ChannelTarget;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn service() -> (tempfile::TempDir, WsSpecService) {
        let dir = tempdir().unwrap();
        let service = WsSpecService::open(dir.path().join("ws.yml"));
        (dir, service)
    }

    fn chat_draft() -> OperationDraft {
        OperationDraft {
            receive: Some(ChannelTarget::Address {
                address: "/chat.send".into(),
                messages: vec!["Chat".into()],
            }),
            protocol: Some("ws".into()),
            pathname: Some("/ws".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_message_in_use_cannot_be_deleted() {
        let (_dir, service) = service();
        service
            .create_message("Chat", &json!({ "payload": { "type": "string" } }))
            .unwrap();
        let name = service.create_operation(&chat_draft()).unwrap();

        let err = service.delete_message("Chat").unwrap_err();
        assert!(err.to_string().contains("_chat.send"));

        assert_eq!(service.delete_operation(&name).unwrap(), vec!["_chat.send"]);
        service.delete_message("Chat").unwrap();
        assert_eq!(service.list_messages().unwrap(), json!({}));
    }

    #[test]
    fn test_operation_views() {
        let (_dir, service) = service();
        service.create_message("Chat", &json!({})).unwrap();
        let name = service.create_operation(&chat_draft()).unwrap();

        let view = service.get_operation(&name).unwrap();
        assert_eq!(view["name"], json!("_chat.send_receive"));
        assert_eq!(view["entrypoint"], json!("/ws"));
        assert_eq!(view["channel"]["ref"], json!("#/channels/_chat.send"));
        assert_eq!(view["progress"], json!("none"));
        assert_eq!(service.list_operations().unwrap().len(), 1);
    }

    #[test]
    fn test_operation_lookup_by_id() {
        let (_dir, service) = service();
        service.create_message("Chat", &json!({})).unwrap();
        let name = service.create_operation(&chat_draft()).unwrap();
        let id = service.get_operation(&name).unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string();

        assert_eq!(service.get_operation_by_id(&id).unwrap()["name"], json!(name));
        assert!(matches!(
            service.get_operation_by_id("missing"),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn test_message_referenced_by_operation_cannot_be_deleted() {
        let (dir, service) = service();
        std::fs::write(
            dir.path().join("ws.yml"),
            r##"asyncapi: 3.0.0
info: { title: t, version: "1" }
channels:
  _lobby: { address: /lobby, messages: {} }
operations:
  _lobby_receive:
    action: receive
    channel: { $ref: "#/channels/_lobby" }
    messages:
      - $ref: "#/components/messages/Ping"
components:
  messages:
    Ping: { payload: { type: string } }
"##,
        )
        .unwrap();

        let err = service.delete_message("Ping").unwrap_err();
        assert!(err.to_string().contains("_lobby_receive"));
        service.delete_operation("_lobby_receive").unwrap();
        service.delete_message("Ping").unwrap();
    }

    #[test]
    fn test_unknown_message_in_draft_writes_nothing() {
        let (dir, service) = service();
        service.store().heal().unwrap();
        let before = std::fs::read_to_string(dir.path().join("ws.yml")).unwrap();
        assert!(service.create_operation(&chat_draft()).is_err());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("ws.yml")).unwrap(),
            before
        );
    }

    #[test]
    fn test_import_rejects_before_locking() {
        let (dir, service) = service();
        let err = service.import_yaml("notes.txt", "asyncapi: 3.0.0").unwrap_err();
        assert!(matches!(err, AppError::InvalidImport(_)));
        assert!(!dir.path().join("ws.yml").exists());
    }
}
