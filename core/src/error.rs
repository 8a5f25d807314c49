//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// String errors default to `General`. Lookup and duplicate failures carry the
/// entity kind (`schema`, `message`, ...) and the offending name.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// A YAML or JSON document could not be parsed into the expected shape.
    #[from(ignore)]
    #[display("Parse Error: {_0}")]
    Parse(String),

    /// A named entity does not exist in the document.
    #[from(ignore)]
    #[display("{kind} '{name}' not found")]
    NotFound {
        /// Entity kind (`schema`, `message`, `operation`, ...).
        kind: &'static str,
        /// The name or id that was looked up.
        name: String,
    },

    /// A named entity already exists and cannot be created again.
    #[from(ignore)]
    #[display("{kind} '{name}' already exists")]
    Duplicate {
        /// Entity kind.
        kind: &'static str,
        /// The colliding name.
        name: String,
    },

    /// An imported document was rejected before merging.
    #[from(ignore)]
    #[display("Invalid import: {_0}")]
    InvalidImport(String),

    /// The caller supplied a request that cannot be applied.
    #[from(ignore)]
    #[display("Invalid input: {_0}")]
    InvalidInput(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

impl AppError {
    /// Shorthand for a [`AppError::NotFound`].
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        AppError::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Shorthand for a [`AppError::Duplicate`].
    pub fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        AppError::Duplicate {
            kind,
            name: name.into(),
        }
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(e: serde_yaml::Error) -> Self {
        AppError::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Parse(e.to_string())
    }
}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;
