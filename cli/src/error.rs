#![deny(missing_docs)]

//! # CLI Errors
//!
//! Error types for the CLI crate.

use derive_more::{Display, From};
use ouroboros_core::AppError;

/// Main error enum for CLI operations.
#[derive(Debug, Display, From)]
pub enum CliError {
    /// IO Error wrapper.
    #[display("IO Error: {}", _0)]
    Io(std::io::Error),

    /// Failure reported by the reconciliation engine.
    #[display("{}", _0)]
    Core(AppError),

    /// General failure message.
    #[display("Operation failed: {}", _0)]
    General(String),
}

/// Manual implementation of the standard Error trait.
///
/// `General(String)` holds a `String`, which is not an `Error`, so a derived
/// `source()` would not compile.
impl std::error::Error for CliError {}

/// Result type alias.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_display_unchanged() {
        let err: CliError = AppError::not_found("schema", "User").into();
        assert_eq!(err.to_string(), "schema 'User' not found");
    }
}
