//! Vector index trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A chunk of document text stored as the atomic retrieval unit.
///
/// Chunk ids are derived from `(source_document_id, sequence_index)`, so
/// re-indexing the same document with the same chunking parameters upserts
/// in place instead of duplicating entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk_id: String,
    pub source_document_id: String,
    pub text: String,
    pub sequence_index: usize,
    pub page_number: Option<u32>,
    pub metadata: serde_json::Value,
}

impl ChunkRecord {
    /// Stable chunk id for a `(document, sequence)` pair
    pub fn chunk_id_for(document_id: &str, sequence_index: usize) -> String {
        format!("{}_{}", document_id, sequence_index)
    }
}

/// A retrieval candidate: a stored chunk with its cosine similarity to the
/// query vector. Produced transiently per query; persisted only as part of
/// a history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: ChunkRecord,
    pub score: f32,
}

/// Trait for vector indexes (exact scan, HNSW graph, pgvector, etc.)
///
/// Whatever the underlying search structure, scores returned to callers are
/// comparable cosine similarities in [-1, 1], ranked descending with ties
/// broken by insertion order.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace a chunk and its embedding.
    ///
    /// The first upsert into a fresh collection fixes the vector dimension
    /// for the collection's lifetime; a later vector of a different length
    /// fails with `Error::DimensionMismatch` and leaves the collection
    /// untouched.
    async fn upsert(&self, chunk: ChunkRecord, vector: Vec<f32>) -> Result<()>;

    /// Upsert several chunks in one call
    async fn upsert_batch(&self, items: Vec<(ChunkRecord, Vec<f32>)>) -> Result<()>;

    /// Nearest neighbors by cosine similarity, descending, at most `limit`
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredChunk>>;

    /// Total number of stored chunks
    async fn count(&self) -> Result<usize>;

    /// Drop all chunks and embeddings; idempotent
    async fn clear(&self) -> Result<()>;

    /// Dimension of the collection, if any vector has been written
    async fn dimension(&self) -> Result<Option<usize>>;
}

/// Outcome of comparing a collection's stored dimension with the configured
/// embedding model's dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaAction {
    /// Collection is fresh or already matches the model
    NoOp,
    /// Collection was built with a different model; it must be cleared and
    /// re-indexed before writes can succeed
    RecreateRequired,
}

/// Decide whether an existing collection is compatible with the configured
/// embedding dimension. Pure function; any interactive prompting belongs to
/// the caller.
pub fn reconcile_schema(existing: Option<usize>, configured: usize) -> SchemaAction {
    match existing {
        Some(dim) if dim != configured => SchemaAction::RecreateRequired,
        _ => SchemaAction::NoOp,
    }
}
