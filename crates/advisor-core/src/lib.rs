//! Core traits and types for the Advisor RAG pipeline
//!
//! This crate defines the capability seams the rest of the system is built
//! against: embedding and chat providers, the vector index, the history
//! store, and the shared data model. Implementations live in the
//! `advisor-rag`, `advisor-providers`, and `advisor-history` crates, which
//! keeps every seam substitutable with a fake in tests.

pub mod chat;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod history;
pub mod index;
pub mod query;
pub mod retry;

pub use chat::ChatProvider;
pub use config::Settings;
pub use document::{ChunkerConfig, Document, IndexingReport};
pub use embedding::EmbeddingProvider;
pub use error::{Error, Result};
pub use history::{HistoryEntry, HistoryPage, HistoryStore, QueryStatistics, SourceDocumentRecord};
pub use index::{reconcile_schema, ChunkRecord, ScoredChunk, SchemaAction, VectorIndex};
pub use query::{
    DocumentMetadata, HealthStatus, QueryRequest, QueryTransaction, SourceDocument,
};
pub use retry::{with_retry, RetryConfig};
