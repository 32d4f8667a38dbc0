//! File-backed JSON stores for user profiles and chat transcripts.
//!
//! Each store keeps one JSON object per file, keyed by the owning user's
//! identity, and rewrites the file atomically under a per-store lock.

pub mod document_store;
pub mod records;

pub use document_store::{JsonDocumentStore, StoreError};
pub use records::{ProfileStore, Transcript, TranscriptStore, Turn, UserProfile};
