use ouroboros_core::asyncapi::ItemKind;
use ouroboros_core::{AppError, AsyncApiSpec, ChannelTarget, OperationDraft, WsSpecService};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;

const EXISTING: &str = r##"
asyncapi: 3.0.0
info: { title: Chat, version: "1" }
servers: {}
channels: {}
operations: {}
components:
  schemas:
    User:
      type: object
      properties:
        id: { type: integer }
  messages: {}
"##;

const UPLOAD: &str = r##"
asyncapi: 3.0.0
info: { title: Upload, version: "1" }
servers:
  stomp-ws: { host: "chat.example.org", protocol: stomp, pathname: /ws }
channels:
  _chat.send:
    address: /chat.send
    messages:
      Joined: { $ref: "#/components/messages/Joined" }
operations:
  _chat.send_receive:
    action: receive
    channel: { $ref: "#/channels/_chat.send" }
    messages:
      - $ref: "#/channels/_chat.send/messages/Joined"
components:
  schemas:
    User:
      type: object
      properties:
        nickname: { type: string }
  messages:
    Joined:
      payload:
        type: object
        properties:
          user: { $ref: "#/components/schemas/User" }
"##;

fn chat_receive(address: &str) -> ChannelTarget {
    ChannelTarget::Address {
        address: address.to_string(),
        messages: vec!["Chat".to_string()],
    }
}

fn load(service: &WsSpecService) -> AsyncApiSpec {
    service.store().read(|doc| Ok(doc.clone())).unwrap()
}

#[test]
fn import_renames_colliding_schema_and_rewrites_messages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ourowebsocket.yml");
    fs::write(&path, EXISTING).unwrap();
    let service = WsSpecService::open(&path);

    let outcome = service.import_yaml("chat-upload.yaml", UPLOAD).unwrap();
    assert_eq!(outcome.renamed.len(), 1);
    assert_eq!(outcome.renamed[0].kind, ItemKind::Schema);
    assert_eq!(outcome.renamed[0].renamed, "User-import");

    let doc = load(&service);
    assert_eq!(
        doc.components.schemas["User"]
            .properties
            .as_ref()
            .unwrap()
            .keys()
            .collect::<Vec<_>>(),
        vec!["id"]
    );
    assert!(doc.components.schemas.contains_key("User-import"));
    assert_eq!(
        doc.components.messages["Joined"].payload.as_ref().unwrap()["properties"]["user"],
        json!({ "$ref": "#/components/schemas/User-import" })
    );

    let op = &doc.operations["_chat.send_receive"];
    assert_eq!(op.entrypoint.as_deref(), Some("/ws"));
    assert!(op.id.is_some());
}

#[test]
fn rejected_import_leaves_document_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ourowebsocket.yml");
    fs::write(&path, EXISTING).unwrap();
    let service = WsSpecService::open(&path);

    let no_info = UPLOAD.replace("info: { title: Upload, version: \"1\" }\n", "");
    let err = service.import_yaml("chat.yml", &no_info).unwrap_err();
    assert!(matches!(err, AppError::InvalidImport(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), EXISTING);
}

#[test]
fn deleting_sole_user_collects_channel() {
    let dir = tempfile::tempdir().unwrap();
    let service = WsSpecService::open(dir.path().join("ourowebsocket.yml"));
    service.create_message("Chat", &json!({ "payload": { "type": "string" } })).unwrap();

    let name = service
        .create_operation(&OperationDraft {
            receive: Some(chat_receive("/chat.send")),
            ..Default::default()
        })
        .unwrap();
    assert!(load(&service).channels.contains_key("_chat.send"));

    let removed = service.delete_operation(&name).unwrap();
    assert_eq!(removed, vec!["_chat.send".to_string()]);
    assert!(!load(&service).channels.contains_key("_chat.send"));
}

#[test]
fn shared_channel_survives_deletion_of_one_user() {
    let dir = tempfile::tempdir().unwrap();
    let service = WsSpecService::open(dir.path().join("ourowebsocket.yml"));
    service.create_message("Chat", &json!({})).unwrap();

    let draft = OperationDraft {
        receive: Some(chat_receive("/chat.send")),
        ..Default::default()
    };
    let first = service.create_operation(&draft).unwrap();
    let second = service.create_operation(&draft).unwrap();
    assert_eq!(second, format!("{}_1", first));

    assert!(service.delete_operation(&first).unwrap().is_empty());
    assert!(load(&service).channels.contains_key("_chat.send"));

    assert_eq!(
        service.delete_operation(&second).unwrap(),
        vec!["_chat.send".to_string()]
    );
}

#[test]
fn self_heals_null_sections_on_first_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ourowebsocket.yml");
    fs::write(
        &path,
        "asyncapi: 3.0.0\ninfo: { title: t, version: '1' }\noperations: ~\ncomponents: ~\n",
    )
    .unwrap();
    let service = WsSpecService::open(&path);

    assert_eq!(service.list_operations().unwrap().len(), 0);
    let healed: serde_json::Value = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(healed["operations"].is_object());
    assert!(healed["components"]["messages"].is_object());
    assert!(healed["channels"].is_object());
}
