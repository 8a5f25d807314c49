//! # Schema Module
//!
//! - **model**: The typed schema node shared by OpenAPI and AsyncAPI documents.
//! - **flatten**: Cycle-safe flattening into `field:type` counts.
//! - **compare**: Per-schema structural equivalence.

pub mod compare;
pub mod flatten;
pub mod model;

pub use compare::{compare_schemas, count_deltas, CountDelta, SchemaMatchReport};
pub use flatten::{FlattenedSchemas, SchemaFlattener, TypeCounts};
pub use model::{Schema, SchemaMap, SchemaType};
