//! Query history ledger for Advisor
//!
//! Every query transaction, successful or not, becomes one immutable
//! [`HistoryEntry`] plus denormalized source-document rows. Statistics are
//! derived over the full ledger at call time; there are no precomputed
//! rollups to drift out of sync.

mod store;

pub use store::{FileHistoryStore, MemoryHistoryStore};

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use advisor_core::{
    HistoryEntry, HistoryPage, HistoryStore, QueryStatistics, QueryTransaction, Result,
    SourceDocumentRecord,
};

/// Characters of source content kept in each denormalized row
const PREVIEW_CHARS: usize = 500;

/// Service for recording and inspecting query history
pub struct HistoryService {
    store: Arc<dyn HistoryStore>,
}

impl HistoryService {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    /// Record a finalized transaction as one durable history entry.
    ///
    /// The entry id is the transaction's query id. Appends never mutate a
    /// previously recorded entry.
    pub async fn record(&self, txn: &QueryTransaction) -> Result<Uuid> {
        let entry = HistoryEntry {
            id: txn.query_id,
            query: txn.query_text.clone(),
            chat_response: txn.response_text.clone(),
            top_k: txn.top_k,
            effective_k: txn.effective_k,
            response_time_ms: txn.duration_ms,
            source_document_count: txn.source_documents.len(),
            created_at: txn.started_at,
            success: txn.success,
            error_message: txn.error_message.clone(),
        };

        let sources: Vec<SourceDocumentRecord> = txn
            .source_documents
            .iter()
            .map(|doc| SourceDocumentRecord {
                id: Uuid::new_v4(),
                query_id: txn.query_id,
                content_preview: doc.content.chars().take(PREVIEW_CHARS).collect(),
                similarity_score: doc.score,
                document_metadata: serde_json::to_value(&doc.metadata).ok(),
                created_at: txn.started_at,
            })
            .collect();

        self.store.append(entry, sources).await?;
        info!(query_id = %txn.query_id, success = txn.success, "query history recorded");
        Ok(txn.query_id)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<HistoryEntry>> {
        self.store.get(id).await
    }

    pub async fn sources_for(&self, id: Uuid) -> Result<Vec<SourceDocumentRecord>> {
        self.store.sources_for(id).await
    }

    /// Page of history entries, newest first
    pub async fn list(&self, limit: usize, offset: usize) -> Result<HistoryPage> {
        self.store.list(limit, offset).await
    }

    /// Aggregate statistics computed over the full ledger at call time
    pub async fn statistics(&self) -> Result<QueryStatistics> {
        let entries = self.store.entries().await?;
        let now = Utc::now();

        let total = entries.len() as u64;
        let successful = entries.iter().filter(|e| e.success).count() as u64;
        let failed = total - successful;
        let success_rate = if total > 0 {
            successful as f64 / total as f64
        } else {
            0.0
        };

        let avg_duration_ms = if total > 0 {
            let sum: u64 = entries.iter().map(|e| e.response_time_ms).sum();
            Some(sum as f64 / total as f64)
        } else {
            None
        };

        let count_since = |cutoff: Duration| {
            entries
                .iter()
                .filter(|e| now.signed_duration_since(e.created_at) <= cutoff)
                .count() as u64
        };

        Ok(QueryStatistics {
            total,
            successful,
            failed,
            success_rate,
            avg_duration_ms,
            queries_last_day: count_since(Duration::days(1)),
            queries_last_week: count_since(Duration::days(7)),
            queries_last_month: count_since(Duration::days(30)),
        })
    }
}
