#![forbid(unsafe_code)]

//! Layout blob storage.
//!
//! The store hands [`LayoutStorage`] an opaque JSON string on every commit
//! and asks for it back once at startup. What sits behind the trait is the
//! host's business.
//!
//! # Atomic Writes
//!
//! [`JsonFileStorage`] writes to a temp file next to the target and renames
//! it over the target, so a crash mid-write leaves the old blob intact.

use std::cell::{Cell, RefCell};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

/// Storage failure. Never fatal to the store: loads fall back to defaults and
/// failed saves are logged.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("layout storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Persistence backend for the layout blob.
pub trait LayoutStorage {
    /// The last saved blob, or `None` when nothing was ever saved.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replace the saved blob.
    fn save(&mut self, blob: &str) -> Result<(), StorageError>;
}

/// In-memory storage.
///
/// Clones share the same slot, so a caller can keep a handle to inspect what
/// a store persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blob: Rc<RefCell<Option<String>>>,
    saves: Rc<Cell<usize>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with a blob, as if saved by an earlier session.
    #[must_use]
    pub fn with_blob(blob: impl Into<String>) -> Self {
        let storage = Self::default();
        *storage.blob.borrow_mut() = Some(blob.into());
        storage
    }

    /// Current blob contents.
    #[must_use]
    pub fn blob(&self) -> Option<String> {
        self.blob.borrow().clone()
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl LayoutStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.blob())
    }

    fn save(&mut self, blob: &str) -> Result<(), StorageError> {
        *self.blob.borrow_mut() = Some(blob.to_owned());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

/// Storage backed by one JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// The parent directory must already exist.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl LayoutStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn save(&mut self, blob: &str) -> Result<(), StorageError> {
        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, blob).map_err(|e| self.io_error(e))?;
        std::fs::rename(&temp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_clones_share_the_slot() {
        let handle = MemoryStorage::new();
        let mut storage = handle.clone();
        assert_eq!(storage.load().unwrap(), None);
        storage.save("{}").unwrap();
        assert_eq!(handle.blob().as_deref(), Some("{}"));
        assert_eq!(handle.save_count(), 1);
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("layout.json"));
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn file_save_replaces_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        let mut storage = JsonFileStorage::new(&path);
        storage.save(r#"{"a":1}"#).unwrap();
        storage.save(r#"{"a":2}"#).unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some(r#"{"a":2}"#));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn unwritable_directory_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonFileStorage::new(dir.path().join("missing").join("layout.json"));
        let err = storage.save("{}").unwrap_err();
        assert!(err.to_string().contains("layout.json"));
    }
}
