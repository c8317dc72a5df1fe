//! History ledger trait and types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

/// Durable record of one finalized query transaction. Created once, never
/// mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub query: String,
    pub chat_response: String,
    pub top_k: usize,
    pub effective_k: usize,
    pub response_time_ms: u64,
    pub source_document_count: usize,
    pub created_at: DateTime<Utc>,
    pub success: bool,
    pub error_message: Option<String>,
}

/// Denormalized source-document row attached to a history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocumentRecord {
    pub id: Uuid,
    pub query_id: Uuid,
    /// First 500 characters of the source chunk
    pub content_preview: String,
    pub similarity_score: f32,
    pub document_metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// One page of history entries, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPage {
    pub items: Vec<HistoryEntry>,
    pub total_count: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Aggregate statistics over the full ledger, computed at call time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryStatistics {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    /// Fraction in [0, 1]; zero for an empty ledger
    pub success_rate: f64,
    pub avg_duration_ms: Option<f64>,
    pub queries_last_day: u64,
    pub queries_last_week: u64,
    pub queries_last_month: u64,
}

/// Trait for append-only history storage
///
/// Appends are keyed by generated unique ids, so concurrent writers never
/// conflict. Reads may observe a slightly stale snapshot under concurrent
/// appends.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append one entry with its source-document rows; single durable write
    async fn append(&self, entry: HistoryEntry, sources: Vec<SourceDocumentRecord>) -> Result<()>;

    /// Look up one entry by id
    async fn get(&self, id: Uuid) -> Result<Option<HistoryEntry>>;

    /// Source documents recorded for one entry
    async fn sources_for(&self, id: Uuid) -> Result<Vec<SourceDocumentRecord>>;

    /// Page of entries, ordered newest-first
    async fn list(&self, limit: usize, offset: usize) -> Result<HistoryPage>;

    /// Snapshot of every entry, used for statistics
    async fn entries(&self) -> Result<Vec<HistoryEntry>>;
}
