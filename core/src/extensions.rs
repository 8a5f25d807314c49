//! # Vendor Extensions
//!
//! The `x-ouroboros-*` fields carried by persisted documents, and the
//! `Diff` / `Progress` markers that are part of the external contract.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix shared by every vendor extension key.
pub const EXTENSION_PREFIX: &str = "x-ouroboros-";

/// Stable operation identifier.
pub const X_ID: &str = "x-ouroboros-id";
/// Per-operation drift marker.
pub const X_DIFF: &str = "x-ouroboros-diff";
/// Per-operation implementation maturity marker.
pub const X_PROGRESS: &str = "x-ouroboros-progress";
/// Free-form operation tag.
pub const X_TAG: &str = "x-ouroboros-tag";
/// Human readable description of the last request mismatch.
pub const X_DIFF_LOG: &str = "x-ouroboros-diff-log";
/// Scanned-operation opt-in for response comparison.
pub const X_RESPONSE: &str = "x-ouroboros-response";
/// Property ordering of a schema.
pub const X_ORDERS: &str = "x-ouroboros-orders";
/// Entry point (server pathname) of a WebSocket operation.
pub const X_ENTRYPOINT: &str = "x-ouroboros-entrypoint";
/// Mock payload expression.
pub const X_MOCK: &str = "x-ouroboros-mock";

/// Value of [`X_RESPONSE`] that opts an operation into response comparison.
pub const RESPONSE_USE: &str = "use";

/// Value stored in [`X_TAG`] when a request mismatch resets the tag.
pub const TAG_NONE: &str = "none";

/// Which side(s) of an operation drifted from the scanned service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Diff {
    /// In sync.
    #[default]
    None,
    /// Request parameters or body differ.
    Request,
    /// Declared responses differ.
    Response,
    /// Both request and response differ.
    Both,
    /// Observed in the scan but not declared in the file.
    Endpoint,
}

impl Diff {
    /// True when the response side is currently out of sync.
    pub fn has_response(self) -> bool {
        matches!(self, Diff::Response | Diff::Both)
    }

    /// True when the request side is currently out of sync.
    pub fn has_request(self) -> bool {
        matches!(self, Diff::Request | Diff::Both)
    }

    /// Marker after a request comparison, keeping any response-side drift.
    pub fn after_request(self, differs: bool) -> Diff {
        match (differs, self.has_response()) {
            (true, true) => Diff::Both,
            (true, false) => Diff::Request,
            (false, true) => Diff::Response,
            (false, false) => Diff::None,
        }
    }

    /// Marker after a response comparison, keeping any request-side drift.
    pub fn after_response(self, differs: bool) -> Diff {
        match (differs, self.has_request()) {
            (true, true) => Diff::Both,
            (true, false) => Diff::Response,
            (false, true) => Diff::Request,
            (false, false) => Diff::None,
        }
    }

    /// Lowercase wire form.
    pub fn as_str(self) -> &'static str {
        match self {
            Diff::None => "none",
            Diff::Request => "request",
            Diff::Response => "response",
            Diff::Both => "both",
            Diff::Endpoint => "endpoint",
        }
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implementation maturity of an operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Progress {
    /// Not started.
    #[default]
    None,
    /// Served by a mock.
    Mock,
    /// Implemented and matching the scan.
    Completed,
}

impl Progress {
    /// Lowercase wire form.
    pub fn as_str(self) -> &'static str {
        match self {
            Progress::None => "none",
            Progress::Mock => "mock",
            Progress::Completed => "completed",
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
