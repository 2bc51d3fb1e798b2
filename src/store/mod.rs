//! Single-document store with optimistic concurrency.
//!
//! The whole dataset is one JSON document. Every read hands back the
//! document together with the [`VersionToken`] of the revision it came
//! from, and every write must present that token. A store rejects a write
//! whose token is no longer current with [`StoreError::VersionConflict`];
//! there is no locking and no automatic retry, so callers that hit a
//! conflict start over from [`DocumentStore::read`].
//!
//! Nothing is cached between calls: each read goes to the backing store.

pub mod github;
pub mod memory;

pub use github::GitHubStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use thiserror::Error;

use crate::models::Document;

/// Opaque identifier of a stored revision of the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document as read, paired with the revision it was read at.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub document: Document,
    pub version: VersionToken,
}

/// Acknowledgement of a successful write.
#[derive(Debug, Clone)]
pub struct WriteAck {
    /// Token of the revision the write produced.
    pub version: VersionToken,
    /// Commit identifier, when the backing store has one.
    pub commit: Option<String>,
}

/// Errors that can occur while reading or writing the document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or answered with an error.
    #[error("{0}")]
    Unavailable(String),
    /// The stored content is not a valid document.
    #[error("Stored document is corrupt: {0}")]
    Corrupt(String),
    /// The document changed after the presented version was read.
    #[error("Document changed since version {0} was read; reload and retry")]
    VersionConflict(VersionToken),
}

/// Read and conditionally replace the single stored document.
pub trait DocumentStore: Send + Sync + 'static {
    /// Fetches the current document and its version token.
    fn read(&self) -> impl Future<Output = Result<Snapshot, StoreError>> + Send;

    /// Replaces the document if `version` is still current.
    ///
    /// `message` is recorded with the new revision.
    fn write(
        &self,
        document: &Document,
        version: &VersionToken,
        message: &str,
    ) -> impl Future<Output = Result<WriteAck, StoreError>> + Send;
}

/// Serializes a document the way it is committed: pretty JSON, two-space indent.
pub fn encode_document(document: &Document) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec_pretty(document).map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// Parses stored bytes into a document.
pub fn decode_document(bytes: &[u8]) -> Result<Document, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt(e.to_string()))
}
