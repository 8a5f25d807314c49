//! # Channel Graph Maintenance
//!
//! Keeps the operation → channel → server references of an AsyncAPI document
//! consistent while operations are created, edited and removed. Channels are
//! created on demand from addresses and garbage-collected once no operation
//! references them anymore.

use crate::asyncapi::document::{
    Action, AsyncApiSpec, Channel, Reference, Reply, Server, WsOperation,
};
use crate::error::{AppError, AppResult};
use crate::extensions::{Diff, Progress};
use crate::refs::{channel_message_pointer, channel_ref, message_ref, server_ref};
use regex::Regex;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Host given to servers created on demand.
pub const DEFAULT_SERVER_HOST: &str = "localhost:8080";

/// WebSocket binding version attached to channels created on demand.
pub const WS_BINDING_VERSION: &str = "0.1.0";

/// How a side of an operation designates its channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelTarget {
    /// An existing channel, referenced by name.
    Named {
        /// Channel name.
        name: String,
        /// Component messages to make available on the channel.
        messages: Vec<String>,
    },
    /// A destination address; the channel is derived and created when missing.
    Address {
        /// Destination address such as `/chat.send`.
        address: String,
        /// Component messages to make available on the channel.
        messages: Vec<String>,
    },
}

impl ChannelTarget {
    /// Messages requested for this side.
    pub fn messages(&self) -> &[String] {
        match self {
            ChannelTarget::Named { messages, .. } | ChannelTarget::Address { messages, .. } => {
                messages
            }
        }
    }

    /// Name of the channel this target resolves to.
    pub fn channel_name(&self) -> String {
        match self {
            ChannelTarget::Named { name, .. } => name.clone(),
            ChannelTarget::Address { address, .. } => channel_name_for_address(address),
        }
    }
}

/// Caller request describing an operation in terms of channels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationDraft {
    /// Channel the application receives on.
    pub receive: Option<ChannelTarget>,
    /// Channel the application replies (or sends) on.
    pub reply: Option<ChannelTarget>,
    /// Server protocol; together with `pathname` selects or creates a server.
    pub protocol: Option<String>,
    /// Server pathname, also recorded as the operation entrypoint.
    pub pathname: Option<String>,
}

/// Derives a channel name from an address: `/chat.send` → `_chat.send`,
/// `/topic/room` → `_topic_room`.
pub fn channel_name_for_address(address: &str) -> String {
    format!("_{}", address.trim_start_matches('/').replace('/', "_"))
}

/// Deterministic server name `{protocol}-{sanitized pathname}`.
pub fn server_name(protocol: &str, pathname: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM.get_or_init(|| Regex::new(r"[^A-Za-z0-9]+").expect("Invalid regex"));
    let sanitized = re.replace_all(pathname, "-");
    format!("{}-{}", protocol, sanitized.trim_matches('-'))
}

/// Default transport bindings of a channel created on demand.
pub fn default_channel_bindings() -> Value {
    json!({ "ws": { "bindingVersion": WS_BINDING_VERSION } })
}

/// Makes sure the channel designated by `target` exists and carries the requested
/// messages. Returns the channel name.
///
/// A named channel must already exist. An address creates its derived channel
/// (with default bindings) when missing. Every requested message must exist in
/// `components.messages`.
pub fn ensure_channel_exists(doc: &mut AsyncApiSpec, target: &ChannelTarget) -> AppResult<String> {
    validate_target(doc, target)?;

    let name = target.channel_name();
    let channel = match target {
        ChannelTarget::Named { .. } => match doc.channels.get_mut(&name) {
            Some(channel) => channel,
            None => return Err(AppError::not_found("channel", name)),
        },
        ChannelTarget::Address { address, .. } => {
            doc.channels.entry(name.clone()).or_insert_with(|| {
                log::debug!("Creating channel '{}' for address {}", name, address);
                Channel {
                    address: Some(address.clone()),
                    bindings: Some(default_channel_bindings()),
                    ..Default::default()
                }
            })
        }
    };

    for message in target.messages() {
        if !channel.references_message(message) {
            channel
                .messages
                .insert(message.clone(), Reference::to(message_ref(message)));
        }
    }

    Ok(name)
}

/// Returns the name of the server for `protocol` + `pathname`, creating it with
/// [`DEFAULT_SERVER_HOST`] when missing.
pub fn ensure_server_exists(doc: &mut AsyncApiSpec, protocol: &str, pathname: &str) -> String {
    let name = server_name(protocol, pathname);
    doc.servers.entry(name.clone()).or_insert_with(|| {
        log::debug!("Creating server '{}'", name);
        Server {
            host: DEFAULT_SERVER_HOST.to_string(),
            protocol: protocol.to_string(),
            pathname: Some(pathname.to_string()),
            ..Default::default()
        }
    });
    name
}

/// Base operation name for a receive/reply channel pair.
pub fn operation_base_name(receive: Option<&str>, reply: Option<&str>) -> Option<String> {
    match (receive, reply) {
        (Some(receive), Some(reply)) => Some(format!("{}_to_{}", receive, reply)),
        (Some(receive), None) => Some(format!("{}_receive", receive)),
        (None, Some(reply)) => Some(format!("{}_send", reply)),
        (None, None) => None,
    }
}

/// `base`, or `base_1`, `base_2`, ... whichever is free first.
pub fn unique_operation_name(doc: &AsyncApiSpec, base: &str) -> String {
    if !doc.operations.contains_key(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !doc.operations.contains_key(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Creates a new operation from `draft`. Returns the operation name.
pub fn create_operation(doc: &mut AsyncApiSpec, draft: &OperationDraft) -> AppResult<String> {
    validate_draft(doc, draft)?;

    let mut op = build_operation(doc, draft)?;
    op.id = Some(uuid::Uuid::new_v4().to_string());

    let receive = draft.receive.as_ref().map(ChannelTarget::channel_name);
    let reply = draft.reply.as_ref().map(ChannelTarget::channel_name);
    let base = operation_base_name(receive.as_deref(), reply.as_deref())
        .ok_or_else(|| AppError::InvalidInput("operation needs a receive or reply channel".into()))?;
    let name = unique_operation_name(doc, &base);

    log::info!("Created operation '{}'", name);
    doc.operations.insert(name.clone(), op);
    Ok(name)
}

/// Replaces the channels and messages of operation `name` with `draft`, keeping
/// its id and markers, then removes channels the edit orphaned.
///
/// Returns the names of the removed channels.
pub fn update_operation(
    doc: &mut AsyncApiSpec,
    name: &str,
    draft: &OperationDraft,
) -> AppResult<Vec<String>> {
    let before = match doc.operations.get(name) {
        Some(op) => op.referenced_channels(),
        None => return Err(AppError::not_found("operation", name)),
    };
    validate_draft(doc, draft)?;

    let rebuilt = build_operation(doc, draft)?;
    let after = rebuilt.referenced_channels();
    if let Some(op) = doc.operations.get_mut(name) {
        op.action = rebuilt.action;
        op.channel = rebuilt.channel;
        op.messages = rebuilt.messages;
        op.reply = rebuilt.reply;
        if rebuilt.entrypoint.is_some() {
            op.entrypoint = rebuilt.entrypoint;
        }
    }

    let dropped: BTreeSet<String> = before.difference(&after).cloned().collect();
    let removed = prune_orphan_channels(doc, &dropped);
    log::info!("Updated operation '{}'", name);
    Ok(removed)
}

/// Removes operation `name` and every channel only it referenced.
///
/// Returns the removed operation and the names of the removed channels.
pub fn delete_operation(
    doc: &mut AsyncApiSpec,
    name: &str,
) -> AppResult<(WsOperation, Vec<String>)> {
    let op = doc
        .operations
        .shift_remove(name)
        .ok_or_else(|| AppError::not_found("operation", name))?;
    let removed = prune_orphan_channels(doc, &op.referenced_channels());
    log::info!("Deleted operation '{}'", name);
    Ok((op, removed))
}

/// Removes each channel of `candidates` that no operation still references.
/// Returns the removed names.
pub fn prune_orphan_channels(
    doc: &mut AsyncApiSpec,
    candidates: &BTreeSet<String>,
) -> Vec<String> {
    let orphans: Vec<String> = candidates
        .iter()
        .filter(|channel| doc.channels.contains_key(*channel))
        .filter(|channel| !doc.channel_in_use(channel))
        .cloned()
        .collect();
    for channel in &orphans {
        doc.channels.shift_remove(channel);
        log::debug!("Removed orphaned channel '{}'", channel);
    }
    orphans
}

fn validate_draft(doc: &AsyncApiSpec, draft: &OperationDraft) -> AppResult<()> {
    if draft.receive.is_none() && draft.reply.is_none() {
        return Err(AppError::InvalidInput(
            "operation needs a receive or reply channel".into(),
        ));
    }
    if draft.protocol.is_some() != draft.pathname.is_some() {
        return Err(AppError::InvalidInput(
            "server protocol and pathname must be given together".into(),
        ));
    }
    for target in draft.receive.iter().chain(draft.reply.iter()) {
        validate_target(doc, target)?;
    }
    Ok(())
}

fn validate_target(doc: &AsyncApiSpec, target: &ChannelTarget) -> AppResult<()> {
    if let ChannelTarget::Named { name, .. } = target {
        if !doc.channels.contains_key(name) {
            return Err(AppError::not_found("channel", name.clone()));
        }
    }
    if let ChannelTarget::Address { address, .. } = target {
        if address.trim_start_matches('/').is_empty() {
            return Err(AppError::InvalidInput(format!(
                "channel address '{}' is empty",
                address
            )));
        }
    }
    for message in target.messages() {
        if !doc.components.messages.contains_key(message) {
            return Err(AppError::not_found("message", message.clone()));
        }
    }
    Ok(())
}

/// Resolves the draft's channels (creating them as needed) and assembles the
/// operation body. Identity and markers are left at their defaults.
fn build_operation(doc: &mut AsyncApiSpec, draft: &OperationDraft) -> AppResult<WsOperation> {
    let server = match (&draft.protocol, &draft.pathname) {
        (Some(protocol), Some(pathname)) => Some(ensure_server_exists(doc, protocol, pathname)),
        _ => None,
    };

    let mut sides = Vec::new();
    for target in draft.receive.iter().chain(draft.reply.iter()) {
        let channel = ensure_channel_exists(doc, target)?;
        if let (Some(server), Some(entry)) = (&server, doc.channels.get_mut(&channel)) {
            let server_pointer = Reference::to(server_ref(server));
            if !entry.servers.contains(&server_pointer) {
                entry.servers.push(server_pointer);
            }
        }
        let messages = target
            .messages()
            .iter()
            .map(|m| Reference::to(channel_message_pointer(&channel, m)))
            .collect::<Vec<_>>();
        sides.push((channel, messages));
    }

    let mut sides = sides.into_iter();
    let (action, (channel, messages), reply) = match (&draft.receive, &draft.reply) {
        (Some(_), Some(_)) => {
            let main = sides.next();
            let reply = sides.next();
            match (main, reply) {
                (Some(main), Some((reply_channel, reply_messages))) => (
                    Action::Receive,
                    main,
                    Some(Reply {
                        channel: Some(Reference::to(channel_ref(&reply_channel))),
                        messages: reply_messages,
                        ..Default::default()
                    }),
                ),
                _ => return Err(AppError::General("channel resolution failed".into())),
            }
        }
        (Some(_), None) => match sides.next() {
            Some(main) => (Action::Receive, main, None),
            None => return Err(AppError::General("channel resolution failed".into())),
        },
        (None, Some(_)) => match sides.next() {
            Some(main) => (Action::Send, main, None),
            None => return Err(AppError::General("channel resolution failed".into())),
        },
        (None, None) => {
            return Err(AppError::InvalidInput(
                "operation needs a receive or reply channel".into(),
            ))
        }
    };

    Ok(WsOperation {
        action,
        channel: Reference::to(channel_ref(&channel)),
        messages,
        reply,
        id: None,
        entrypoint: draft.pathname.clone(),
        diff: Diff::None,
        progress: Progress::None,
        extra: Default::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asyncapi::document::Message;
    use pretty_assertions::assert_eq;

    fn doc_with_message(name: &str) -> AsyncApiSpec {
        let mut doc = AsyncApiSpec::default();
        doc.components.messages.insert(
            name.to_string(),
            Message {
                name: Some(name.to_string()),
                ..Default::default()
            },
        );
        doc
    }

    fn address(address: &str, messages: &[&str]) -> ChannelTarget {
        ChannelTarget::Address {
            address: address.to_string(),
            messages: messages.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn test_channel_name_for_address() {
        assert_eq!(channel_name_for_address("/chat.send"), "_chat.send");
        assert_eq!(channel_name_for_address("/topic/room/1"), "_topic_room_1");
        assert_eq!(channel_name_for_address("queue"), "_queue");
    }

    #[test]
    fn test_server_name_is_deterministic() {
        assert_eq!(server_name("ws", "/ws"), "ws-ws");
        assert_eq!(server_name("stomp", "/api/v1/ws"), "stomp-api-v1-ws");
    }

    #[test]
    fn test_address_creates_channel_with_bindings() {
        let mut doc = doc_with_message("Chat");
        let name = ensure_channel_exists(&mut doc, &address("/chat.send", &["Chat"])).unwrap();
        assert_eq!(name, "_chat.send");
        let channel = &doc.channels["_chat.send"];
        assert_eq!(channel.address.as_deref(), Some("/chat.send"));
        assert_eq!(channel.bindings, Some(default_channel_bindings()));
        assert_eq!(
            channel.messages["Chat"].reference,
            "#/components/messages/Chat"
        );
    }

    #[test]
    fn test_named_channel_must_exist() {
        let mut doc = doc_with_message("Chat");
        let err = ensure_channel_exists(
            &mut doc,
            &ChannelTarget::Named {
                name: "_missing".into(),
                messages: vec![],
            },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "channel '_missing' not found");
    }

    #[test]
    fn test_named_channel_appends_new_messages_once() {
        let mut doc = doc_with_message("Chat");
        ensure_channel_exists(&mut doc, &address("/room", &[])).unwrap();
        let named = ChannelTarget::Named {
            name: "_room".into(),
            messages: vec!["Chat".into()],
        };
        ensure_channel_exists(&mut doc, &named).unwrap();
        ensure_channel_exists(&mut doc, &named).unwrap();
        assert_eq!(doc.channels["_room"].messages.len(), 1);
    }

    #[test]
    fn test_unknown_message_rejected_without_mutation() {
        let mut doc = AsyncApiSpec::default();
        let before = doc.clone();
        assert!(ensure_channel_exists(&mut doc, &address("/x", &["Nope"])).is_err());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_ensure_server_reuses_existing() {
        let mut doc = AsyncApiSpec::default();
        let first = ensure_server_exists(&mut doc, "ws", "/ws");
        doc.servers.get_mut(&first).unwrap().host = "example.org".into();
        let second = ensure_server_exists(&mut doc, "ws", "/ws");
        assert_eq!(first, second);
        assert_eq!(doc.servers.len(), 1);
        assert_eq!(doc.servers[&first].host, "example.org");
    }

    #[test]
    fn test_operation_naming_and_collisions() {
        assert_eq!(
            operation_base_name(Some("_a"), Some("_b")).as_deref(),
            Some("_a_to__b")
        );
        assert_eq!(operation_base_name(Some("_a"), None).as_deref(), Some("_a_receive"));
        assert_eq!(operation_base_name(None, Some("_b")).as_deref(), Some("_b_send"));

        let mut doc = doc_with_message("Chat");
        let draft = OperationDraft {
            receive: Some(address("/chat.send", &["Chat"])),
            ..Default::default()
        };
        assert_eq!(create_operation(&mut doc, &draft).unwrap(), "_chat.send_receive");
        assert_eq!(create_operation(&mut doc, &draft).unwrap(), "_chat.send_receive_1");
        assert_eq!(create_operation(&mut doc, &draft).unwrap(), "_chat.send_receive_2");
    }

    #[test]
    fn test_create_request_reply_operation() {
        let mut doc = doc_with_message("Chat");
        let draft = OperationDraft {
            receive: Some(address("/chat.send", &["Chat"])),
            reply: Some(address("/topic/room", &["Chat"])),
            protocol: Some("ws".into()),
            pathname: Some("/ws".into()),
        };
        let name = create_operation(&mut doc, &draft).unwrap();
        assert_eq!(name, "_chat.send_to__topic_room");

        let op = &doc.operations[&name];
        assert_eq!(op.action, Action::Receive);
        assert_eq!(op.entrypoint.as_deref(), Some("/ws"));
        assert_eq!(
            op.messages[0].reference,
            "#/channels/_chat.send/messages/Chat"
        );
        let reply = op.reply.as_ref().unwrap();
        assert_eq!(
            reply.channel.as_ref().unwrap().reference,
            "#/channels/_topic_room"
        );
        assert!(op.id.is_some());
        assert_eq!(
            doc.channels["_topic_room"].servers,
            vec![Reference::to("#/servers/ws-ws")]
        );
    }

    #[test]
    fn test_reply_only_operation_sends() {
        let mut doc = doc_with_message("Chat");
        let draft = OperationDraft {
            reply: Some(address("/topic/news", &["Chat"])),
            ..Default::default()
        };
        let name = create_operation(&mut doc, &draft).unwrap();
        assert_eq!(name, "_topic_news_send");
        assert_eq!(doc.operations[&name].action, Action::Send);
        assert!(doc.operations[&name].reply.is_none());
    }

    #[test]
    fn test_empty_draft_rejected() {
        let mut doc = AsyncApiSpec::default();
        let err = create_operation(&mut doc, &OperationDraft::default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_delete_collects_exclusive_channel_only() {
        let mut doc = doc_with_message("Chat");
        let solo = OperationDraft {
            receive: Some(address("/chat.send", &["Chat"])),
            reply: Some(address("/topic/room", &["Chat"])),
            ..Default::default()
        };
        let other = OperationDraft {
            reply: Some(address("/topic/room", &["Chat"])),
            ..Default::default()
        };
        let first = create_operation(&mut doc, &solo).unwrap();
        create_operation(&mut doc, &other).unwrap();

        let (_, removed) = delete_operation(&mut doc, &first).unwrap();
        assert_eq!(removed, vec!["_chat.send".to_string()]);
        assert!(!doc.channels.contains_key("_chat.send"));
        assert!(doc.channels.contains_key("_topic_room"));
    }

    #[test]
    fn test_update_collects_dropped_channel() {
        let mut doc = doc_with_message("Chat");
        let name = create_operation(
            &mut doc,
            &OperationDraft {
                receive: Some(address("/old", &["Chat"])),
                ..Default::default()
            },
        )
        .unwrap();
        let id = doc.operations[&name].id.clone();

        let removed = update_operation(
            &mut doc,
            &name,
            &OperationDraft {
                receive: Some(address("/new", &["Chat"])),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(removed, vec!["_old".to_string()]);
        assert!(doc.channels.contains_key("_new"));
        assert_eq!(doc.operations[&name].id, id);
        assert_eq!(doc.operations[&name].channel.reference, "#/channels/_new");
    }

    #[test]
    fn test_prune_skips_used_and_unknown_channels() {
        let mut doc = doc_with_message("Chat");
        create_operation(
            &mut doc,
            &OperationDraft {
                receive: Some(address("/chat.send", &["Chat"])),
                ..Default::default()
            },
        )
        .unwrap();
        ensure_channel_exists(&mut doc, &address("/idle", &["Chat"])).unwrap();

        let candidates: BTreeSet<String> = ["_chat.send", "_idle", "_ghost"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(prune_orphan_channels(&mut doc, &candidates), vec!["_idle".to_string()]);
        assert!(doc.channels.contains_key("_chat.send"));
    }

    #[test]
    fn test_delete_unknown_operation() {
        let mut doc = AsyncApiSpec::default();
        let err = delete_operation(&mut doc, "nope").unwrap_err();
        assert_eq!(err.to_string(), "operation 'nope' not found");
    }
}
