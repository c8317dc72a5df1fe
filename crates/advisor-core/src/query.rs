//! Query request, transaction, and health types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An incoming question with retrieval parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub top_k: usize,
    /// Minimum cosine similarity a candidate must reach to be used as
    /// grounding evidence
    pub similarity_cutoff: f32,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>, top_k: usize) -> Self {
        Self {
            query: query.into(),
            top_k,
            similarity_cutoff: 0.6,
        }
    }
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            top_k: 5,
            similarity_cutoff: 0.6,
        }
    }
}

/// Structured metadata carried by a retrieved source document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub file_name: Option<String>,
    pub page: Option<u32>,
    pub source: Option<String>,
}

/// A source document returned to the caller alongside the answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub content: String,
    pub score: f32,
    pub metadata: DocumentMetadata,
}

/// One query transaction, from validation to response availability.
///
/// Owned by the query pipeline until it is finalized, then handed to the
/// history ledger as an immutable record. Exactly one transaction exists
/// per incoming question, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryTransaction {
    pub query_id: Uuid,
    pub query_text: String,
    /// Number of sources the caller asked for
    pub top_k: usize,
    /// Number of candidates actually fetched (over-fetch before cutoff)
    pub effective_k: usize,
    pub response_text: String,
    /// Capped at `top_k`, descending by similarity. The answer may be
    /// grounded in more evidence than is shown here.
    pub source_documents: Vec<SourceDocument>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    pub error_message: Option<String>,
}

impl QueryTransaction {
    /// Open a transaction for an incoming question
    pub fn begin(query_text: impl Into<String>, top_k: usize) -> Self {
        Self {
            query_id: Uuid::new_v4(),
            query_text: query_text.into(),
            top_k,
            effective_k: 0,
            response_text: String::new(),
            source_documents: Vec::new(),
            started_at: Utc::now(),
            duration_ms: 0,
            success: false,
            error_message: None,
        }
    }
}

/// Per-component reachability, reported independently so a broken chat
/// backend does not mask a healthy index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub vector_index: bool,
    pub embedding_provider: bool,
    pub chat_provider: bool,
}

impl HealthStatus {
    pub fn all_healthy(&self) -> bool {
        self.vector_index && self.embedding_provider && self.chat_provider
    }
}
