//! In-process document store.
//!
//! Holds the serialized document and uses its SHA-256 as the version
//! token, so it rejects stale writes exactly like the GitHub store does.
//! Used for local development and tests.

use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::sync::Mutex;

use super::{
    decode_document, encode_document, DocumentStore, Snapshot, StoreError, VersionToken, WriteAck,
};
use crate::models::Document;

#[derive(Debug)]
struct Revision {
    content: Vec<u8>,
    version: VersionToken,
}

/// Document store kept in memory.
#[derive(Debug)]
pub struct MemoryStore {
    current: Mutex<Revision>,
    /// Messages of every accepted write, oldest first.
    history: Mutex<Vec<String>>,
}

impl MemoryStore {
    /// Creates a store seeded with `document`.
    pub fn new(document: &Document) -> Result<Self, StoreError> {
        Ok(Self::from_bytes(encode_document(document)?))
    }

    /// Creates a store seeded with raw content, which is not validated
    /// until the first read.
    pub fn from_bytes(content: Vec<u8>) -> Self {
        let version = content_hash(&content);
        Self {
            current: Mutex::new(Revision { content, version }),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Creates a store seeded from a JSON file on disk.
    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read(path).map_err(|e| {
            StoreError::Unavailable(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(Self::from_bytes(content))
    }

    /// Returns the messages of all accepted writes.
    pub async fn history(&self) -> Vec<String> {
        self.history.lock().await.clone()
    }

    /// Returns the stored bytes exactly as last written.
    pub async fn content(&self) -> Vec<u8> {
        self.current.lock().await.content.clone()
    }
}

impl DocumentStore for MemoryStore {
    async fn read(&self) -> Result<Snapshot, StoreError> {
        let current = self.current.lock().await;
        let document = decode_document(&current.content)?;
        Ok(Snapshot {
            document,
            version: current.version.clone(),
        })
    }

    async fn write(
        &self,
        document: &Document,
        version: &VersionToken,
        message: &str,
    ) -> Result<WriteAck, StoreError> {
        let content = encode_document(document)?;

        let mut current = self.current.lock().await;
        if current.version != *version {
            return Err(StoreError::VersionConflict(version.clone()));
        }

        let new_version = content_hash(&content);
        *current = Revision {
            content,
            version: new_version.clone(),
        };
        drop(current);

        self.history.lock().await.push(message.to_string());

        Ok(WriteAck {
            version: new_version,
            commit: None,
        })
    }
}

fn content_hash(content: &[u8]) -> VersionToken {
    VersionToken::new(format!("{:x}", Sha256::digest(content)))
}
