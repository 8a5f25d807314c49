//! # Specification Store
//!
//! The persisted YAML document is the single source of truth. A `SpecStore`
//! guards one document file with one reader/writer lock: every read runs under
//! the shared lock, every mutation under the exclusive lock. Each call loads the
//! whole document, runs the caller's closure, and (for mutations) writes the
//! whole document back only if the closure succeeded.
//!
//! Loading self-heals missing or `null` required sections. A repaired document
//! is written back immediately and the repair is logged as a warning.

use crate::asyncapi::document::AsyncApiSpec;
use crate::error::AppResult;
use crate::normalization::{heal_async_document, heal_rest_document};
use crate::oas::document::RestApiSpec;
use parking_lot::{RwLock, RwLockWriteGuard};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Marker recorded when the document file did not exist yet.
const NEW_FILE: &str = "<new file>";

/// A document kind the store knows how to heal.
pub trait SpecDocument: Serialize + DeserializeOwned + Default {
    /// Human readable kind used in log lines.
    const KIND: &'static str;

    /// Fills required sections of the raw document, returning what was repaired.
    fn heal(raw: &mut Value) -> Vec<String>;
}

impl SpecDocument for RestApiSpec {
    const KIND: &'static str = "REST";

    fn heal(raw: &mut Value) -> Vec<String> {
        heal_rest_document(raw)
    }
}

impl SpecDocument for AsyncApiSpec {
    const KIND: &'static str = "WebSocket";

    fn heal(raw: &mut Value) -> Vec<String> {
        heal_async_document(raw)
    }
}

struct Loaded<D> {
    document: D,
    repaired: Vec<String>,
}

/// Lock-guarded access to one persisted specification file.
pub struct SpecStore<D> {
    path: PathBuf,
    lock: RwLock<()>,
    _document: PhantomData<fn() -> D>,
}

impl<D: SpecDocument> SpecStore<D> {
    /// Creates a store for `path`. The file is created lazily on first access.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
            _document: PhantomData,
        }
    }

    /// Location of the document file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `f` against the current document under the shared lock.
    ///
    /// When the document needed repair, the lock is re-taken exclusively to
    /// persist the repair and then downgraded before `f` runs.
    pub fn read<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&D) -> AppResult<T>,
    {
        let guard = self.lock.read();
        let loaded = self.load()?;
        if loaded.repaired.is_empty() {
            return f(&loaded.document);
        }
        drop(guard);

        let guard = self.lock.write();
        let loaded = self.load()?;
        if !loaded.repaired.is_empty() {
            self.persist_repair(&loaded)?;
        }
        let _guard = RwLockWriteGuard::downgrade(guard);
        f(&loaded.document)
    }

    /// Runs `f` against the current document under the exclusive lock and
    /// persists the result if `f` returns `Ok`.
    ///
    /// On error the file is left exactly as it was (including pending repairs).
    pub fn write<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut D) -> AppResult<T>,
    {
        let _guard = self.lock.write();
        let mut loaded = self.load()?;
        let out = f(&mut loaded.document)?;
        if !loaded.repaired.is_empty() {
            log::warn!(
                "Repaired {} spec {}: {}",
                D::KIND,
                self.path.display(),
                loaded.repaired.join(", ")
            );
        }
        self.persist(&loaded.document)?;
        Ok(out)
    }

    /// Heals the document on disk if needed. Returns what was repaired.
    pub fn heal(&self) -> AppResult<Vec<String>> {
        let _guard = self.lock.write();
        let loaded = self.load()?;
        if !loaded.repaired.is_empty() {
            self.persist_repair(&loaded)?;
        }
        Ok(loaded.repaired)
    }

    fn load(&self) -> AppResult<Loaded<D>> {
        if !self.path.exists() {
            return Ok(Loaded {
                document: D::default(),
                repaired: vec![NEW_FILE.to_string()],
            });
        }

        let text = fs::read_to_string(&self.path)?;
        let mut raw: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_yaml::from_str(&text)?
        };
        let repaired = D::heal(&mut raw);
        let document = serde_json::from_value(raw)?;
        Ok(Loaded { document, repaired })
    }

    fn persist_repair(&self, loaded: &Loaded<D>) -> AppResult<()> {
        log::warn!(
            "Repaired {} spec {}: {}",
            D::KIND,
            self.path.display(),
            loaded.repaired.join(", ")
        );
        self.persist(&loaded.document)
    }

    fn persist(&self, document: &D) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(document)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }
}
