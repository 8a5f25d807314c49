//! # AsyncAPI (WebSocket) Module
//!
//! - **document**: Typed AsyncAPI 3.0 document.
//! - **graph**: Channel/server creation and channel garbage collection around operation edits.
//! - **import**: Rename-on-collision merge of uploaded documents.

pub mod document;
pub mod graph;
pub mod import;

pub use document::{
    Action, AsyncApiSpec, Channel, Message, Reference, Reply, Server, WsComponents, WsOperation,
};
pub use graph::{
    create_operation, delete_operation, ensure_channel_exists, ensure_server_exists,
    update_operation, ChannelTarget, OperationDraft,
};
pub use import::{import_yaml, ImportOutcome, ItemKind, RenamedItem};
