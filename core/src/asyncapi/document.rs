//! # AsyncAPI Document
//!
//! Typed view of the persisted WebSocket specification (AsyncAPI 3.0).
//! Bindings, payload schemas and unknown keys stay untyped and are carried verbatim.

use crate::extensions::{Diff, Progress};
use crate::refs::{channel_message_ref, channel_ref_name, message_ref_name};
use crate::schema::SchemaMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::fmt;

/// AsyncAPI version written into new documents.
pub const ASYNCAPI_VERSION: &str = "3.0.0";

/// The whole WebSocket specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsyncApiSpec {
    /// `asyncapi` version string.
    #[serde(default = "default_asyncapi_version")]
    pub asyncapi: String,
    /// `info` object.
    #[serde(default)]
    pub info: Value,
    /// Servers keyed by name.
    #[serde(default)]
    pub servers: IndexMap<String, Server>,
    /// Channels keyed by name.
    #[serde(default)]
    pub channels: IndexMap<String, Channel>,
    /// Operations keyed by name.
    #[serde(default)]
    pub operations: IndexMap<String, WsOperation>,
    /// Reusable components.
    #[serde(default)]
    pub components: WsComponents,
    /// Other top-level keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

fn default_asyncapi_version() -> String {
    ASYNCAPI_VERSION.to_string()
}

impl Default for AsyncApiSpec {
    fn default() -> Self {
        Self {
            asyncapi: default_asyncapi_version(),
            info: json!({ "title": "Ouroboros API", "version": "v1" }),
            servers: IndexMap::new(),
            channels: IndexMap::new(),
            operations: IndexMap::new(),
            components: WsComponents::default(),
            extra: IndexMap::new(),
        }
    }
}

impl AsyncApiSpec {
    /// Finds an operation by its `x-ouroboros-id`.
    pub fn find_operation_by_id(&self, id: &str) -> Option<(&str, &WsOperation)> {
        self.operations
            .iter()
            .find(|(_, op)| op.id.as_deref() == Some(id))
            .map(|(name, op)| (name.as_str(), op))
    }

    /// True when any operation uses `channel` as its main or reply channel.
    pub fn channel_in_use(&self, channel: &str) -> bool {
        self.operations
            .values()
            .any(|op| op.referenced_channels().contains(channel))
    }

    /// Names of the channels whose message list references `message`.
    pub fn channels_using_message(&self, message: &str) -> Vec<String> {
        self.channels
            .iter()
            .filter(|(_, channel)| channel.references_message(message))
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// `components` of an AsyncAPI document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WsComponents {
    /// Payload schemas.
    #[serde(default)]
    pub schemas: SchemaMap,
    /// Reusable messages.
    #[serde(default)]
    pub messages: IndexMap<String, Message>,
    /// Other component kinds.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A `$ref` object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Pointer target.
    #[serde(rename = "$ref")]
    pub reference: String,
}

impl Reference {
    /// Wraps a pointer string.
    pub fn to(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }
}

/// A server entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
    /// `host[:port]`.
    pub host: String,
    /// Transport protocol (`ws`, `wss`, `stomp`, ...).
    pub protocol: String,
    /// Path the server is mounted at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pathname: Option<String>,
    /// Other server fields.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A channel entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Destination address (`/chat.send`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Messages that may travel on this channel, keyed by message id.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub messages: IndexMap<String, Reference>,
    /// Servers the channel is available on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Reference>,
    /// Protocol bindings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bindings: Option<Value>,
    /// Other channel fields.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Channel {
    /// True when one of the message entries points at component message `message`.
    pub fn references_message(&self, message: &str) -> bool {
        self.messages
            .values()
            .any(|r| message_ref_name(&r.reference).as_deref() == Some(message))
    }
}

/// A reusable message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Machine name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Payload schema (inline or `$ref`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Headers, title, examples, vendor keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Direction of an operation, seen from the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// The application sends on the channel.
    Send,
    /// The application receives on the channel.
    Receive,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Send => "send",
            Action::Receive => "receive",
        })
    }
}

/// Reply side of a request/reply operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Channel the reply travels on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Reference>,
    /// Messages the reply may carry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Reference>,
    /// Other reply fields.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// An operation entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsOperation {
    /// Send or receive.
    pub action: Action,
    /// Main channel.
    pub channel: Reference,
    /// Messages of the main channel used by this operation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Reference>,
    /// Optional reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<Reply>,
    /// Stable identifier.
    #[serde(
        rename = "x-ouroboros-id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    /// Server pathname this operation is reachable through.
    #[serde(
        rename = "x-ouroboros-entrypoint",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub entrypoint: Option<String>,
    /// Drift marker.
    #[serde(rename = "x-ouroboros-diff", default)]
    pub diff: Diff,
    /// Maturity marker.
    #[serde(rename = "x-ouroboros-progress", default)]
    pub progress: Progress,
    /// Other operation fields.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl WsOperation {
    /// Names of the main and reply channels.
    pub fn referenced_channels(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        names.extend(channel_ref_name(&self.channel.reference));
        if let Some(reply_channel) = self.reply.as_ref().and_then(|r| r.channel.as_ref()) {
            names.extend(channel_ref_name(&reply_channel.reference));
        }
        names
    }

    /// Every message reference of the operation, main side first.
    pub fn message_refs_mut(&mut self) -> impl Iterator<Item = &mut Reference> {
        let reply = self
            .reply
            .as_mut()
            .map(|r| r.messages.iter_mut())
            .into_iter()
            .flatten();
        self.messages.iter_mut().chain(reply)
    }

    /// Component message names used by the operation, resolving channel-scoped pointers
    /// through `doc`.
    pub fn message_names(&self, doc: &AsyncApiSpec) -> BTreeSet<String> {
        let reply = self.reply.iter().flat_map(|r| r.messages.iter());
        self.messages
            .iter()
            .chain(reply)
            .filter_map(|r| resolve_message_name(doc, &r.reference))
            .collect()
    }
}

/// Resolves a component or channel-scoped message pointer to a component message name.
pub fn resolve_message_name(doc: &AsyncApiSpec, reference: &str) -> Option<String> {
    if let Some(name) = message_ref_name(reference) {
        return Some(name);
    }
    let (channel, key) = channel_message_ref(reference)?;
    doc.channels
        .get(&channel)?
        .messages
        .get(&key)
        .and_then(|r| message_ref_name(&r.reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CHAT: &str = r##"
asyncapi: 3.0.0
info: { title: Chat, version: "1" }
servers:
  ws-ws: { host: "localhost:8080", protocol: ws, pathname: /ws }
channels:
  _chat.send:
    address: /chat.send
    messages:
      ChatMessage: { $ref: "#/components/messages/ChatMessage" }
    bindings: { ws: { bindingVersion: 0.1.0 } }
  _topic_room:
    address: /topic/room
    messages:
      ChatMessage: { $ref: "#/components/messages/ChatMessage" }
operations:
  _chat.send_to__topic_room:
    action: receive
    channel: { $ref: "#/channels/_chat.send" }
    messages:
      - $ref: "#/channels/_chat.send/messages/ChatMessage"
    reply:
      channel: { $ref: "#/channels/_topic_room" }
      messages:
        - $ref: "#/channels/_topic_room/messages/ChatMessage"
    x-ouroboros-id: 7f1c
    x-ouroboros-diff: none
    x-ouroboros-progress: none
components:
  schemas:
    Chat: { type: object, properties: { text: { type: string } } }
  messages:
    ChatMessage:
      name: ChatMessage
      payload: { $ref: "#/components/schemas/Chat" }
      contentType: application/json
"##;

    #[test]
    fn test_parse_chat_document() {
        let doc: AsyncApiSpec = serde_yaml::from_str(CHAT).unwrap();
        let op = &doc.operations["_chat.send_to__topic_room"];
        assert_eq!(op.action, Action::Receive);
        assert_eq!(
            op.referenced_channels().into_iter().collect::<Vec<_>>(),
            vec!["_chat.send".to_string(), "_topic_room".to_string()]
        );
        assert_eq!(
            doc.components.messages["ChatMessage"].extra["contentType"],
            json!("application/json")
        );
        assert_eq!(doc.find_operation_by_id("7f1c").unwrap().0, "_chat.send_to__topic_room");
    }

    #[test]
    fn test_channel_usage_queries() {
        let doc: AsyncApiSpec = serde_yaml::from_str(CHAT).unwrap();
        assert!(doc.channel_in_use("_topic_room"));
        assert!(!doc.channel_in_use("_lobby"));
        assert_eq!(
            doc.channels_using_message("ChatMessage"),
            vec!["_chat.send".to_string(), "_topic_room".to_string()]
        );
    }

    #[test]
    fn test_message_names_resolve_channel_scoped_refs() {
        let doc: AsyncApiSpec = serde_yaml::from_str(CHAT).unwrap();
        let names = doc.operations["_chat.send_to__topic_room"].message_names(&doc);
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["ChatMessage"]);
    }

    #[test]
    fn test_serialize_keeps_markers() {
        let doc: AsyncApiSpec = serde_yaml::from_str(CHAT).unwrap();
        let yaml = serde_yaml::to_string(&doc).unwrap();
        assert!(yaml.contains("x-ouroboros-progress: none"));
        let back: AsyncApiSpec = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, doc);
    }
}
