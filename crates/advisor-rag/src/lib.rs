//! Retrieval-augmented generation pipeline for Advisor
//!
//! Raw documents go in through the [`IndexingPipeline`] (chunk, embed,
//! upsert); questions go through the [`QueryEngine`] (embed, over-fetch,
//! cutoff, tree-summarize, record). Both sides talk to providers and the
//! vector index only through the `advisor-core` traits.

mod chunker;
mod index;
mod indexer;
mod query;
mod synthesis;

#[cfg(test)]
pub(crate) mod test_support;

pub use chunker::SentenceChunker;
pub use index::InMemoryVectorIndex;
pub use indexer::IndexingPipeline;
pub use query::{effective_k, QueryEngine, MAX_EFFECTIVE_K};
pub use synthesis::{tree_summarize, SynthesisConfig};

// Re-export core types for convenience
pub use advisor_core::{
    ChatProvider, ChunkRecord, ChunkerConfig, Document, EmbeddingProvider, Error, HealthStatus,
    IndexingReport, QueryRequest, QueryTransaction, Result, ScoredChunk, VectorIndex,
};
