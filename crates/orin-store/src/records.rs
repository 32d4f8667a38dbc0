use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::document_store::{JsonDocumentStore, StoreError};

/// Attribute map remembered about one user, such as `name` or `location`.
pub type UserProfile = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Public struct `Turn` used across Orin components.
pub struct Turn {
    pub user: String,
    pub assistant: String,
}

/// Ordered conversation history for one user, oldest turn first.
pub type Transcript = Vec<Turn>;

#[derive(Clone)]
/// Public struct `ProfileStore` used across Orin components.
pub struct ProfileStore {
    documents: JsonDocumentStore<UserProfile>,
}

impl ProfileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            documents: JsonDocumentStore::open(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.documents.path()
    }

    pub fn ensure_exists(&self) -> Result<(), StoreError> {
        self.documents.ensure_exists()
    }

    /// Loads the profile for `owner`, empty when none has been written.
    pub fn load(&self, owner: &str) -> Result<UserProfile, StoreError> {
        self.documents.read(owner)
    }

    pub fn save(&self, owner: &str, profile: &UserProfile) -> Result<(), StoreError> {
        self.documents.write(owner, profile)
    }

    /// Mutates the profile for `owner` under the store lock.
    pub fn update(
        &self,
        owner: &str,
        apply: impl FnOnce(&mut UserProfile),
    ) -> Result<UserProfile, StoreError> {
        self.documents.update(owner, apply)
    }
}

#[derive(Clone)]
/// Public struct `TranscriptStore` used across Orin components.
///
/// Completed turns are append-only; nothing in the public surface can reorder
/// or rewrite persisted history.
pub struct TranscriptStore {
    documents: JsonDocumentStore<Transcript>,
}

impl TranscriptStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            documents: JsonDocumentStore::open(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.documents.path()
    }

    pub fn ensure_exists(&self) -> Result<(), StoreError> {
        self.documents.ensure_exists()
    }

    /// Loads the transcript for `owner`, empty when none has been written.
    pub fn load(&self, owner: &str) -> Result<Transcript, StoreError> {
        self.documents.read(owner)
    }

    /// Appends one completed turn and returns the updated transcript.
    pub fn append(&self, owner: &str, turn: Turn) -> Result<Transcript, StoreError> {
        self.documents
            .update(owner, move |transcript| transcript.push(turn))
    }
}
