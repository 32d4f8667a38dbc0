use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use orin_core::write_text_atomic;

#[derive(Debug, Error)]
/// Enumerates supported `StoreError` values.
pub enum StoreError {
    #[error("failed to read store document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store document {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("store lock poisoned")]
    LockPoisoned,
    #[error("failed to persist store document: {0:#}")]
    Persist(anyhow::Error),
}

/// Public struct `JsonDocumentStore` used across Orin components.
///
/// One JSON object per file: top-level keys are owner identities, values are
/// the per-owner documents. A missing file or missing key reads as the
/// document's default value. Reads and writes serialize through one lock so
/// concurrent read-modify-write cycles cannot drop each other's updates.
pub struct JsonDocumentStore<V> {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
    _marker: PhantomData<fn() -> V>,
}

impl<V> Clone for JsonDocumentStore<V> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            lock: Arc::clone(&self.lock),
            _marker: PhantomData,
        }
    }
}

impl<V> JsonDocumentStore<V>
where
    V: Serialize + DeserializeOwned + Clone + Default,
{
    /// Opens a store over `path` without touching the filesystem.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
            _marker: PhantomData,
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Creates the backing file as an empty JSON object when absent.
    pub fn ensure_exists(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        if self.path.exists() {
            return Ok(());
        }
        write_text_atomic(&self.path, "{}").map_err(StoreError::Persist)
    }

    /// Reads the document for `key`, defaulting when the key or file is absent.
    pub fn read(&self, key: &str) -> Result<V, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let documents = self.read_all()?;
        Ok(documents.get(key).cloned().unwrap_or_default())
    }

    /// Replaces the document for `key`.
    pub fn write(&self, key: &str, value: &V) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut documents = self.read_all()?;
        documents.insert(key.to_string(), value.clone());
        self.write_all(&documents)
    }

    /// Applies `apply` to the document for `key` and persists the result.
    ///
    /// The lock is held across the whole read-modify-write cycle; the updated
    /// document is returned so callers see what was stored.
    pub fn update(&self, key: &str, apply: impl FnOnce(&mut V)) -> Result<V, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut documents = self.read_all()?;
        let document = documents.entry(key.to_string()).or_default();
        apply(document);
        let updated = document.clone();
        self.write_all(&documents)?;
        Ok(updated)
    }

    /// Lists owner keys in sorted order.
    pub fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let documents = self.read_all()?;
        Ok(documents.keys().cloned().collect())
    }

    fn read_all(&self) -> Result<BTreeMap<String, V>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new())
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(trimmed).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, documents: &BTreeMap<String, V>) -> Result<(), StoreError> {
        let serialized = serde_json::to_string_pretty(documents)
            .map_err(|error| StoreError::Persist(error.into()))?;
        write_text_atomic(&self.path, &serialized).map_err(StoreError::Persist)
    }
}
