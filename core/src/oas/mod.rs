#![deny(missing_docs)]

//! # OpenAPI (REST) Module
//!
//! - **document**: Typed OpenAPI 3.1 document with `x-ouroboros-*` markers.
//! - **methods**: The closed set of HTTP methods an operation can live under.
//! - **request**: Request-side signature comparison.
//! - **response**: Per-status response comparison.
//! - **sync**: The reconciliation pass tying the comparators together.

pub mod document;
pub mod methods;
pub mod request;
pub mod response;
pub mod sync;

pub use document::{
    ApiResponse, Components, MediaType, Operation, Parameter, PathItem, RequestBody, RestApiSpec,
};
pub use methods::HttpMethod;
pub use request::{request_signature, RequestComparator};
pub use response::compare_responses_for_method;
pub use sync::{synchronize, Scanner, SyncReport};
