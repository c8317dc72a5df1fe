//! Document and chunking types

use serde::{Deserialize, Serialize};

/// A raw document supplied by the corpus source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: serde_json::Value,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: serde_json::Value::Null,
        }
    }
}

/// Configuration for the sentence-aware chunker.
///
/// Defaults match the corpus this system was tuned on: small chunks with a
/// light overlap so sentence boundaries survive the cut points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Upper bound on chunk length, in whitespace tokens
    pub chunk_size: usize,
    /// Tokens of chunk `i` repeated at the start of chunk `i + 1`
    pub chunk_overlap: usize,
    /// Preferred sentence boundary
    pub sentence_separator: String,
    /// Preferred paragraph boundary, tried before sentence boundaries
    pub paragraph_separator: String,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 256,
            chunk_overlap: 20,
            sentence_separator: ".\n".to_string(),
            paragraph_separator: "\n\n\n".to_string(),
        }
    }
}

/// Result of one indexing run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexingReport {
    /// Chunks upserted into the vector index
    pub indexed_chunks: usize,
    /// Documents skipped because they had no extractable text
    pub skipped_documents: usize,
}
