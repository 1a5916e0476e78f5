// Docstore module
// Chunk persistence behind a small async trait, with in-memory and SQLite backends


pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::{KgError, Result};

pub use sqlite::SqliteDocstore;

/// An immutable unit of text addressed by an opaque id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    /// The source document this chunk was split from
    pub ref_doc_id: Option<String>,
}

impl Chunk {
    /// Create a chunk with a freshly generated id
    #[inline]
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), text)
    }

    #[inline]
    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            ref_doc_id: None,
        }
    }

    #[inline]
    pub fn with_ref_doc_id(mut self, ref_doc_id: impl Into<String>) -> Self {
        self.ref_doc_id = Some(ref_doc_id.into());
        self
    }
}

/// A source document before splitting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    #[inline]
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), text)
    }

    #[inline]
    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Chunk storage keyed by chunk id.
///
/// `add` is idempotent for an identical chunk. Adding a chunk whose id is
/// already stored with different content is an error, so two callers can
/// never observe divergent state under one id.
#[async_trait]
pub trait Docstore: Send + Sync {
    async fn add(&self, chunk: &Chunk) -> Result<String>;

    /// Chunks for the ids that exist, in request order. Unknown ids are skipped.
    async fn get_many(&self, ids: &[String]) -> Result<Vec<Chunk>>;

    async fn contains(&self, id: &str) -> Result<bool>;

    /// Returns whether a chunk was removed
    async fn delete(&self, id: &str) -> Result<bool>;
}

fn conflicting_chunk(id: &str) -> KgError {
    KgError::Docstore(format!(
        "Chunk {} already exists with different content",
        id
    ))
}

/// Docstore held entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryDocstore {
    chunks: RwLock<HashMap<String, Chunk>>,
}

impl InMemoryDocstore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.read().map(|chunks| chunks.len()).unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> KgError {
    KgError::Docstore("In-memory docstore lock poisoned".to_string())
}

#[async_trait]
impl Docstore for InMemoryDocstore {
    async fn add(&self, chunk: &Chunk) -> Result<String> {
        let mut chunks = self.chunks.write().map_err(poisoned)?;

        match chunks.get(&chunk.id) {
            Some(existing) if existing == chunk => {}
            Some(_) => return Err(conflicting_chunk(&chunk.id)),
            None => {
                chunks.insert(chunk.id.clone(), chunk.clone());
            }
        }

        Ok(chunk.id.clone())
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Chunk>> {
        let chunks = self.chunks.read().map_err(poisoned)?;
        Ok(ids.iter().filter_map(|id| chunks.get(id).cloned()).collect())
    }

    async fn contains(&self, id: &str) -> Result<bool> {
        let chunks = self.chunks.read().map_err(poisoned)?;
        Ok(chunks.contains_key(id))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut chunks = self.chunks.write().map_err(poisoned)?;
        Ok(chunks.remove(id).is_some())
    }
}
