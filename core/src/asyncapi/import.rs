//! # YAML Import
//!
//! Merges an uploaded AsyncAPI document into the persisted one.
//!
//! Sections are merged in dependency order (schemas, messages, servers,
//! channels, operations) so that each stage can rewrite the references
//! produced by the stages before it. Name collisions are resolved by renaming
//! the imported item (`User` → `User-import` → `User-import1` ...).

use crate::asyncapi::document::{AsyncApiSpec, Reference};
use crate::error::{AppError, AppResult};
use crate::extensions::{Diff, Progress};
use crate::normalization::heal_async_document;
use crate::refs::{
    channel_message_pointer, channel_message_ref, channel_ref, channel_ref_name, message_ref,
    message_ref_name, schema_ref, schema_ref_name, server_ref, server_ref_name,
};
use crate::schema::model::rewrite_value_refs;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Suffix appended to colliding imported names.
pub const IMPORT_SUFFIX: &str = "-import";

/// Kind of an imported item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// `components.schemas` entry.
    Schema,
    /// `components.messages` entry.
    Message,
    /// `servers` entry.
    Server,
    /// `channels` entry.
    Channel,
    /// `operations` entry.
    Operation,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemKind::Schema => "schema",
            ItemKind::Message => "message",
            ItemKind::Server => "server",
            ItemKind::Channel => "channel",
            ItemKind::Operation => "operation",
        })
    }
}

/// One imported item stored under a different name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedItem {
    /// What was renamed.
    pub kind: ItemKind,
    /// Name in the imported document.
    pub original: String,
    /// Name it was stored under.
    pub renamed: String,
    /// Operation action, for renamed operations.
    pub action: Option<String>,
}

/// Result of a successful import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Number of items merged across all sections.
    pub imported: usize,
    /// Items stored under a new name.
    pub renamed: Vec<RenamedItem>,
}

/// Checks the file name and content of an upload and parses it.
///
/// Nothing is merged here; any failure leaves the target untouched.
pub fn parse_import(file_name: &str, content: &str) -> AppResult<AsyncApiSpec> {
    let lower = file_name.to_ascii_lowercase();
    if !(lower.ends_with(".yml") || lower.ends_with(".yaml")) {
        return Err(AppError::InvalidImport(format!(
            "'{}' is not a .yml or .yaml file",
            file_name
        )));
    }

    let mut raw: Value = serde_yaml::from_str(content)
        .map_err(|e| AppError::InvalidImport(format!("unparseable YAML: {}", e)))?;

    let Some(root) = raw.as_object() else {
        return Err(AppError::InvalidImport(
            "document root must be a mapping".into(),
        ));
    };
    for required in ["asyncapi", "info"] {
        if root.get(required).map_or(true, Value::is_null) {
            return Err(AppError::InvalidImport(format!(
                "missing required field '{}'",
                required
            )));
        }
    }

    heal_async_document(&mut raw);
    serde_json::from_value(raw).map_err(|e| AppError::InvalidImport(e.to_string()))
}

/// Validates and merges an uploaded document into `target`.
pub fn import_yaml(
    target: &mut AsyncApiSpec,
    file_name: &str,
    content: &str,
) -> AppResult<ImportOutcome> {
    let imported = parse_import(file_name, content)?;
    let outcome = merge_document(target, imported);
    log::info!(
        "Imported {} item(s) from '{}', {} renamed",
        outcome.imported,
        file_name,
        outcome.renamed.len()
    );
    Ok(outcome)
}

/// Merges an already validated document into `target`.
pub fn merge_document(target: &mut AsyncApiSpec, imported: AsyncApiSpec) -> ImportOutcome {
    let mut merger = Merger::default();

    // schemas
    let mut added_schemas = Vec::new();
    for (name, schema) in imported.components.schemas {
        let stored = merger.claim(ItemKind::Schema, &name, &target.components.schemas, None);
        target.components.schemas.insert(stored.clone(), schema);
        added_schemas.push(stored);
    }
    let schema_renames = merger.renames(ItemKind::Schema);
    let rewrite_schema = |r: &str| {
        schema_ref_name(r)
            .and_then(|n| schema_renames.get(&n))
            .map(|new| schema_ref(new))
    };
    for name in &added_schemas {
        if let Some(schema) = target.components.schemas.get_mut(name) {
            schema.rewrite_refs(&rewrite_schema);
        }
    }

    // messages
    for (name, mut message) in imported.components.messages {
        if let Some(payload) = message.payload.as_mut() {
            rewrite_value_refs(payload, &rewrite_schema);
        }
        for value in message.extra.values_mut() {
            rewrite_value_refs(value, &rewrite_schema);
        }
        let stored = merger.claim(ItemKind::Message, &name, &target.components.messages, None);
        target.components.messages.insert(stored, message);
    }
    let message_renames = merger.renames(ItemKind::Message);

    // servers
    let first_pathname = imported
        .servers
        .values()
        .next()
        .and_then(|server| server.pathname.clone());
    for (name, server) in imported.servers {
        let stored = merger.claim(ItemKind::Server, &name, &target.servers, None);
        target.servers.insert(stored, server);
    }
    let server_renames = merger.renames(ItemKind::Server);

    // channels
    let mut channel_plan = Vec::new();
    for (name, channel) in imported.channels {
        let stored = merger.claim(ItemKind::Channel, &name, &target.channels, None);
        target.channels.insert(stored.clone(), Default::default());
        channel_plan.push((stored, channel));
    }
    let channel_renames = merger.renames(ItemKind::Channel);
    for (stored, mut channel) in channel_plan {
        channel.messages = channel
            .messages
            .into_iter()
            .map(|(key, reference)| {
                let key = message_renames.get(&key).cloned().unwrap_or(key);
                (key, rename_message_ref(reference, &message_renames, &channel_renames))
            })
            .collect();
        for server in channel.servers.iter_mut() {
            if let Some(new) = server_ref_name(&server.reference).and_then(|n| server_renames.get(&n))
            {
                server.reference = server_ref(new);
            }
        }
        target.channels.insert(stored, channel);
    }

    // operations
    for (name, mut op) in imported.operations {
        if let Some(new) = channel_ref_name(&op.channel.reference).and_then(|n| channel_renames.get(&n)) {
            op.channel.reference = channel_ref(new);
        }
        if let Some(reply_channel) = op.reply.as_mut().and_then(|r| r.channel.as_mut()) {
            if let Some(new) =
                channel_ref_name(&reply_channel.reference).and_then(|n| channel_renames.get(&n))
            {
                reply_channel.reference = channel_ref(new);
            }
        }
        for reference in op.message_refs_mut() {
            *reference = rename_message_ref(reference.clone(), &message_renames, &channel_renames);
        }

        if op.id.is_none() {
            op.id = Some(uuid::Uuid::new_v4().to_string());
        }
        op.progress = Progress::None;
        op.diff = Diff::None;
        if op.entrypoint.is_none() {
            op.entrypoint = first_pathname.clone();
        }

        let action = op.action.to_string();
        let stored = merger.claim(ItemKind::Operation, &name, &target.operations, Some(action));
        target.operations.insert(stored, op);
    }

    merger.into_outcome()
}

/// Rewrites a component (`#/components/messages/X`) or channel-scoped
/// (`#/channels/Y/messages/X`) message pointer through the rename maps.
fn rename_message_ref(
    reference: Reference,
    message_renames: &HashMap<String, String>,
    channel_renames: &HashMap<String, String>,
) -> Reference {
    if let Some(new) = message_ref_name(&reference.reference).and_then(|n| message_renames.get(&n))
    {
        return Reference::to(message_ref(new));
    }
    if let Some((channel, message)) = channel_message_ref(&reference.reference) {
        let channel_changed = channel_renames.get(&channel);
        let message_changed = message_renames.get(&message);
        if channel_changed.is_some() || message_changed.is_some() {
            return Reference::to(channel_message_pointer(
                channel_changed.unwrap_or(&channel),
                message_changed.unwrap_or(&message),
            ));
        }
    }
    reference
}

/// Picks `name`, or the first free `name-import`, `name-import1`, ... among `taken`.
pub fn unique_import_name<V>(name: &str, taken: &IndexMap<String, V>) -> String {
    if !taken.contains_key(name) {
        return name.to_string();
    }
    let first = format!("{}{}", name, IMPORT_SUFFIX);
    if !taken.contains_key(&first) {
        return first;
    }
    (1..)
        .map(|n| format!("{}{}", first, n))
        .find(|candidate| !taken.contains_key(candidate))
        .unwrap_or(first)
}

#[derive(Default)]
struct Merger {
    imported: usize,
    renamed: Vec<RenamedItem>,
}

impl Merger {
    fn claim<V>(
        &mut self,
        kind: ItemKind,
        name: &str,
        taken: &IndexMap<String, V>,
        action: Option<String>,
    ) -> String {
        self.imported += 1;
        let stored = unique_import_name(name, taken);
        if stored != name {
            log::debug!("Imported {} '{}' stored as '{}'", kind, name, stored);
            self.renamed.push(RenamedItem {
                kind,
                original: name.to_string(),
                renamed: stored.clone(),
                action,
            });
        }
        stored
    }

    fn renames(&self, kind: ItemKind) -> HashMap<String, String> {
        self.renamed
            .iter()
            .filter(|item| item.kind == kind)
            .map(|item| (item.original.clone(), item.renamed.clone()))
            .collect()
    }

    fn into_outcome(self) -> ImportOutcome {
        ImportOutcome {
            imported: self.imported,
            renamed: self.renamed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const UPLOAD: &str = r##"
asyncapi: 3.0.0
info: { title: Upload, version: "1" }
servers:
  ws-ws: { host: "chat.example.org", protocol: ws, pathname: /ws }
channels:
  _chat:
    address: /chat
    messages:
      Hello: { $ref: "#/components/messages/Hello" }
    servers:
      - $ref: "#/servers/ws-ws"
operations:
  _chat_receive:
    action: receive
    channel: { $ref: "#/channels/_chat" }
    messages:
      - $ref: "#/channels/_chat/messages/Hello"
components:
  schemas:
    User:
      type: object
      properties:
        name: { type: string }
    Envelope:
      type: object
      properties:
        from: { $ref: "#/components/schemas/User" }
  messages:
    Hello:
      payload: { $ref: "#/components/schemas/User" }
"##;

    fn existing() -> AsyncApiSpec {
        let mut doc = AsyncApiSpec::default();
        doc.components.schemas.insert(
            "User".into(),
            Schema::object([("id", Schema::of_type("integer"))]),
        );
        doc
    }

    #[test]
    fn test_rejects_wrong_extension() {
        let err = parse_import("upload.json", UPLOAD).unwrap_err();
        assert!(matches!(err, AppError::InvalidImport(_)));
        assert!(parse_import("UPLOAD.YAML", UPLOAD).is_ok());
    }

    #[test]
    fn test_rejects_missing_required_fields() {
        let err = parse_import("a.yml", "asyncapi: 3.0.0\nchannels: {}\n").unwrap_err();
        assert_eq!(err.to_string(), "Invalid import: missing required field 'info'");
        assert!(parse_import("a.yml", "- just\n- a list\n").is_err());
        assert!(parse_import("a.yml", "asyncapi: [unclosed").is_err());
    }

    #[test]
    fn test_unique_import_name_sequence() {
        let mut taken: IndexMap<String, ()> = IndexMap::new();
        assert_eq!(unique_import_name("User", &taken), "User");
        taken.insert("User".into(), ());
        assert_eq!(unique_import_name("User", &taken), "User-import");
        taken.insert("User-import".into(), ());
        assert_eq!(unique_import_name("User", &taken), "User-import1");
        taken.insert("User-import1".into(), ());
        assert_eq!(unique_import_name("User", &taken), "User-import2");
    }

    #[test]
    fn test_schema_rename_flows_into_messages_and_schemas() {
        let mut doc = existing();
        let outcome = import_yaml(&mut doc, "chat.yml", UPLOAD).unwrap();

        assert_eq!(
            outcome.renamed,
            vec![RenamedItem {
                kind: ItemKind::Schema,
                original: "User".into(),
                renamed: "User-import".into(),
                action: None,
            }]
        );
        assert_eq!(outcome.imported, 6);
        assert_eq!(
            doc.components.schemas["User"],
            Schema::object([("id", Schema::of_type("integer"))])
        );
        assert_eq!(
            doc.components.messages["Hello"].payload,
            Some(json!({ "$ref": "#/components/schemas/User-import" }))
        );
        let envelope = &doc.components.schemas["Envelope"];
        assert_eq!(
            envelope.properties.as_ref().unwrap()["from"].reference.as_deref(),
            Some("#/components/schemas/User-import")
        );
    }

    #[test]
    fn test_operations_are_enriched() {
        let mut doc = existing();
        import_yaml(&mut doc, "chat.yml", UPLOAD).unwrap();
        let op = &doc.operations["_chat_receive"];
        assert!(op.id.is_some());
        assert_eq!(op.diff, Diff::None);
        assert_eq!(op.progress, Progress::None);
        assert_eq!(op.entrypoint.as_deref(), Some("/ws"));
    }

    #[test]
    fn test_second_import_renames_every_section() {
        let mut doc = AsyncApiSpec::default();
        import_yaml(&mut doc, "chat.yml", UPLOAD).unwrap();
        let outcome = import_yaml(&mut doc, "chat.yml", UPLOAD).unwrap();
        assert_eq!(outcome.renamed.len(), 6);

        let op = &doc.operations["_chat_receive-import"];
        assert_eq!(op.channel.reference, "#/channels/_chat-import");
        assert_eq!(
            op.messages[0].reference,
            "#/channels/_chat-import/messages/Hello-import"
        );
        let channel = &doc.channels["_chat-import"];
        assert_eq!(
            channel.messages["Hello-import"].reference,
            "#/components/messages/Hello-import"
        );
        assert_eq!(channel.servers[0].reference, "#/servers/ws-ws-import");

        let renamed_op = outcome
            .renamed
            .iter()
            .find(|item| item.kind == ItemKind::Operation)
            .unwrap();
        assert_eq!(renamed_op.action.as_deref(), Some("receive"));
    }

    #[test]
    fn test_invalid_upload_leaves_target_untouched() {
        let mut doc = existing();
        let before = doc.clone();
        assert!(import_yaml(&mut doc, "chat.txt", UPLOAD).is_err());
        assert!(import_yaml(&mut doc, "chat.yml", "info: {}\n").is_err());
        assert_eq!(doc, before);
    }
}
