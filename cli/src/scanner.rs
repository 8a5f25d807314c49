#![deny(missing_docs)]

//! # Scan Sources
//!
//! Supplies the scanned REST specification of the running service, either from
//! a file written by the service or (with the `client` feature) straight from
//! its HTTP endpoint.

use crate::error::CliResult;
use ouroboros_core::{AppError, AppResult, RestApiSpec, Scanner};
use std::fs;
use std::path::PathBuf;

/// Reads a scanned specification from a YAML or JSON file.
pub struct FileScanner {
    /// File written by the running service.
    pub path: PathBuf,
}

impl Scanner for FileScanner {
    fn scan(&self) -> AppResult<RestApiSpec> {
        let text = fs::read_to_string(&self.path)?;
        parse_scanned(&text)
    }
}

/// Fetches a scanned specification over HTTP.
#[cfg(feature = "client")]
pub struct HttpScanner {
    /// Endpoint serving the live specification.
    pub url: String,
}

#[cfg(feature = "client")]
impl Scanner for HttpScanner {
    fn scan(&self) -> AppResult<RestApiSpec> {
        log::debug!("Fetching scanned spec from {}", self.url);
        let mut response = ureq::get(&self.url)
            .call()
            .map_err(|e| AppError::General(format!("GET {} failed: {}", self.url, e)))?;
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| AppError::General(format!("reading {} failed: {}", self.url, e)))?;
        parse_scanned(&text)
    }
}

/// Parses a scanned document. JSON is accepted since YAML is a superset of it.
pub fn parse_scanned(text: &str) -> AppResult<RestApiSpec> {
    serde_yaml::from_str(text).map_err(|e| AppError::Parse(format!("scanned spec: {}", e)))
}

/// Picks the scanner for `source`: an `http(s)://` URL or a file path.
pub fn scanner_for(source: &str) -> CliResult<Box<dyn Scanner>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        return http_scanner(source);
    }
    Ok(Box::new(FileScanner {
        path: PathBuf::from(source),
    }))
}

#[cfg(feature = "client")]
fn http_scanner(source: &str) -> CliResult<Box<dyn Scanner>> {
    Ok(Box::new(HttpScanner {
        url: source.to_string(),
    }))
}

#[cfg(not(feature = "client"))]
fn http_scanner(source: &str) -> CliResult<Box<dyn Scanner>> {
    Err(crate::error::CliError::General(format!(
        "{} needs the `client` feature",
        source
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_scanner_reads_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.json");
        fs::write(
            &path,
            r#"{"openapi":"3.1.0","paths":{"/ping":{"get":{"responses":{}}}}}"#,
        )
        .unwrap();
        let spec = scanner_for(path.to_str().unwrap()).unwrap().scan().unwrap();
        assert!(spec.paths.contains_key("/ping"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let scanner = FileScanner {
            path: PathBuf::from("/definitely/not/here.yml"),
        };
        assert!(matches!(scanner.scan(), Err(AppError::Io(_))));
    }
}
