//! Query pipeline: embed, retrieve, filter, synthesize, record

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use advisor_core::{
    with_retry, ChatProvider, DocumentMetadata, EmbeddingProvider, Error, HealthStatus,
    QueryRequest, QueryTransaction, Result, RetryConfig, ScoredChunk, SourceDocument, VectorIndex,
};
use advisor_history::HistoryService;

use crate::synthesis::{tree_summarize, SynthesisConfig};

/// Cap on the over-fetched candidate count, whatever `top_k` was requested
pub const MAX_EFFECTIVE_K: usize = 15;

/// Over-fetch size for a requested `top_k`: twice the request, capped, so
/// the similarity cutoff can discard candidates and still leave enough to
/// fill the response.
pub fn effective_k(top_k: usize) -> usize {
    (top_k * 2).min(MAX_EFFECTIVE_K)
}

/// The per-question pipeline.
///
/// Every call to [`query`](QueryEngine::query) produces exactly one
/// finalized [`QueryTransaction`] and hands it to the history ledger,
/// whether the question succeeded, failed validation, or died on a
/// provider call. Concurrent queries share the index and ledger; the
/// engine itself holds no per-query state.
pub struct QueryEngine<E: EmbeddingProvider, C: ChatProvider, V: VectorIndex> {
    embedder: Arc<E>,
    chat: Arc<C>,
    index: Arc<V>,
    history: Arc<HistoryService>,
    retry: RetryConfig,
    synthesis: SynthesisConfig,
}

impl<E: EmbeddingProvider, C: ChatProvider, V: VectorIndex> QueryEngine<E, C, V> {
    pub fn new(
        embedder: Arc<E>,
        chat: Arc<C>,
        index: Arc<V>,
        history: Arc<HistoryService>,
    ) -> Self {
        Self {
            embedder,
            chat,
            index,
            history,
            retry: RetryConfig::default(),
            synthesis: SynthesisConfig::default(),
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_synthesis_config(mut self, synthesis: SynthesisConfig) -> Self {
        self.synthesis = synthesis;
        self
    }

    /// Answer one question.
    ///
    /// Never panics and never skips the ledger: failures come back as a
    /// finalized transaction with `success = false`, the error message set,
    /// and whatever sources were computed before the failure.
    pub async fn query(&self, request: &QueryRequest) -> QueryTransaction {
        let started = Instant::now();
        let mut txn = QueryTransaction::begin(&request.query, request.top_k);

        match self.run(request, &mut txn).await {
            Ok(()) => {
                txn.success = true;
                info!(
                    query_id = %txn.query_id,
                    sources = txn.source_documents.len(),
                    "query answered"
                );
            }
            Err(e) => {
                txn.success = false;
                txn.response_text.clear();
                txn.error_message = Some(e.to_string());
                error!(query_id = %txn.query_id, error = %e, "query failed");
            }
        }
        txn.duration_ms = started.elapsed().as_millis() as u64;

        if let Err(e) = self.history.record(&txn).await {
            error!(query_id = %txn.query_id, error = %e, "failed to record query history");
        }
        txn
    }

    async fn run(&self, request: &QueryRequest, txn: &mut QueryTransaction) -> Result<()> {
        if request.query.trim().is_empty() {
            return Err(Error::InvalidQuery("query text must not be empty".into()));
        }
        if request.top_k == 0 {
            return Err(Error::InvalidQuery("top_k must be at least 1".into()));
        }

        txn.effective_k = effective_k(request.top_k);

        let vector = with_retry(&self.retry, "query embedding", || {
            self.embedder.embed(&request.query)
        })
        .await?;

        let candidates = self.index.search(&vector, txn.effective_k).await?;
        let grounded: Vec<ScoredChunk> = candidates
            .into_iter()
            .filter(|c| c.score >= request.similarity_cutoff)
            .collect();
        info!(
            effective_k = txn.effective_k,
            grounded = grounded.len(),
            cutoff = request.similarity_cutoff,
            "retrieval complete"
        );

        // Sources shown to the caller are capped at top_k; the answer below
        // is synthesized from the full cutoff-filtered set. Recorded before
        // synthesis so a chat failure still leaves them on the transaction.
        txn.source_documents = grounded
            .iter()
            .take(request.top_k)
            .map(to_source_document)
            .collect();

        let contexts: Vec<String> = grounded.into_iter().map(|c| c.chunk.text).collect();
        txn.response_text = tree_summarize(
            self.chat.as_ref(),
            &self.synthesis,
            &self.retry,
            &request.query,
            contexts,
        )
        .await?;

        Ok(())
    }

    /// Reachability of each collaborator, reported independently
    pub async fn health(&self) -> HealthStatus {
        HealthStatus {
            vector_index: self.index.count().await.is_ok(),
            embedding_provider: self.embedder.dimension().await.is_ok(),
            chat_provider: self.chat.health().await.is_ok(),
        }
    }
}

fn to_source_document(candidate: &ScoredChunk) -> SourceDocument {
    let chunk = &candidate.chunk;
    SourceDocument {
        content: chunk.text.clone(),
        score: candidate.score,
        metadata: DocumentMetadata {
            file_name: chunk
                .metadata
                .get("file_name")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            page: chunk.page_number,
            source: Some(chunk.source_document_id.clone()),
        },
    }
}
