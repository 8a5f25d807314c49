#![deny(missing_docs)]

//! # Ouroboros Core
//!
//! Reconciliation engine keeping a persisted API specification (OpenAPI for
//! REST, AsyncAPI for WebSocket) in step with the specification scanned from
//! the running service.

/// Shared error types.
pub mod error;

/// `x-ouroboros-*` vendor extension keys and the diff/progress markers.
pub mod extensions;

/// Local `$ref` pointer helpers.
pub mod refs;

/// Schema model, flattening and structural comparison.
pub mod schema;

/// OpenAPI document model, comparators and the sync pipeline.
pub mod oas;

/// AsyncAPI document model, channel graph maintenance and import.
pub mod asyncapi;

/// Self-healing of persisted documents.
mod normalization;

/// Lock-guarded persisted documents.
pub mod store;

/// Persisted-form ↔ API-form JSON conversion.
pub mod json_view;

/// Caller-facing services.
pub mod service;

pub use asyncapi::{
    AsyncApiSpec, ChannelTarget, ImportOutcome, OperationDraft, RenamedItem, WsOperation,
};
pub use error::{AppError, AppResult};
pub use extensions::{Diff, Progress};
pub use oas::{synchronize, HttpMethod, Operation, RestApiSpec, Scanner, SyncReport};
pub use schema::{compare_schemas, Schema, SchemaFlattener, SchemaMatchReport, TypeCounts};
pub use service::{RestSpecService, WsSpecService};
pub use store::{SpecDocument, SpecStore};
