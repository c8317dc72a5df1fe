//! Indexing pipeline: chunk, embed, upsert

use std::sync::Arc;

use tracing::{info, warn};

use advisor_core::{
    with_retry, ChunkRecord, ChunkerConfig, Document, EmbeddingProvider, Error, IndexingReport,
    Result, RetryConfig, VectorIndex,
};

use crate::chunker::SentenceChunker;

/// Orchestrates Chunker -> Embedding Provider -> Vector Index for a corpus.
///
/// Indexing is append-only and idempotent per chunk: chunk ids derive from
/// `(document_id, sequence_index)`, so running the same corpus twice
/// replaces chunks in place instead of duplicating them. When a document
/// fails after retries, chunks from prior documents in the same call stay
/// committed.
pub struct IndexingPipeline<E: EmbeddingProvider, V: VectorIndex> {
    embedder: Arc<E>,
    index: Arc<V>,
    chunker: SentenceChunker,
    retry: RetryConfig,
}

impl<E: EmbeddingProvider, V: VectorIndex> IndexingPipeline<E, V> {
    pub fn new(embedder: Arc<E>, index: Arc<V>, chunker_config: ChunkerConfig) -> Result<Self> {
        Ok(Self {
            embedder,
            index,
            chunker: SentenceChunker::new(chunker_config)?,
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Index a document corpus.
    ///
    /// Empty documents are skipped with a warning. Embedding failures are
    /// retried with exponential backoff; exhausted retries fail the whole
    /// call with `Error::IndexingFailed` naming the offending document.
    pub async fn index(&self, documents: &[Document]) -> Result<IndexingReport> {
        let mut report = IndexingReport::default();

        for document in documents {
            let chunk_texts = match self.chunker.split(&document.text) {
                Ok(chunk_texts) => chunk_texts,
                Err(Error::EmptyDocument) => {
                    warn!(document_id = %document.id, "skipping document with no extractable text");
                    report.skipped_documents += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let vectors = with_retry(&self.retry, "batch embedding", || {
                self.embedder.embed_batch(&chunk_texts)
            })
            .await
            .map_err(|e| Error::IndexingFailed {
                document_id: document.id.clone(),
                cause: e.to_string(),
            })?;

            if vectors.len() != chunk_texts.len() {
                return Err(Error::IndexingFailed {
                    document_id: document.id.clone(),
                    cause: format!(
                        "embedding provider returned {} vectors for {} chunks",
                        vectors.len(),
                        chunk_texts.len()
                    ),
                });
            }

            let items: Vec<(ChunkRecord, Vec<f32>)> = chunk_texts
                .into_iter()
                .zip(vectors)
                .enumerate()
                .map(|(sequence_index, (text, vector))| {
                    let chunk = ChunkRecord {
                        chunk_id: ChunkRecord::chunk_id_for(&document.id, sequence_index),
                        source_document_id: document.id.clone(),
                        text,
                        sequence_index,
                        page_number: None,
                        metadata: document.metadata.clone(),
                    };
                    (chunk, vector)
                })
                .collect();

            let indexed = items.len();
            self.index.upsert_batch(items).await?;
            report.indexed_chunks += indexed;
            info!(document_id = %document.id, chunks = indexed, "document indexed");
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::InMemoryVectorIndex;
    use crate::test_support::{FailingEmbedder, FlakyEmbedder, KeywordEmbedder};

    fn pipeline<E: EmbeddingProvider>(
        embedder: Arc<E>,
        index: Arc<InMemoryVectorIndex>,
    ) -> IndexingPipeline<E, InMemoryVectorIndex> {
        IndexingPipeline::new(embedder, index, ChunkerConfig::default())
            .unwrap()
            .with_retry_config(RetryConfig {
                max_attempts: 3,
                base_delay: std::time::Duration::from_millis(1),
                attempt_timeout: std::time::Duration::from_secs(1),
            })
    }

    #[tokio::test]
    async fn indexes_documents_into_the_vector_index() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let p = pipeline(Arc::new(KeywordEmbedder::new()), index.clone());

        let docs = vec![Document::new(
            "rules",
            "The disc is out of bounds when it contacts anything other than a player in bounds.",
        )];
        let report = p.index(&docs).await.unwrap();

        assert!(report.indexed_chunks >= 1);
        assert_eq!(report.skipped_documents, 0);
        assert_eq!(index.count().await.unwrap(), report.indexed_chunks);
    }

    #[tokio::test]
    async fn reindexing_the_same_document_leaves_count_unchanged() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let p = pipeline(Arc::new(KeywordEmbedder::new()), index.clone());

        let docs = vec![Document::new(
            "rules",
            "The disc is out of bounds when it contacts anything other than a player in bounds.",
        )];
        p.index(&docs).await.unwrap();
        let count_after_first = index.count().await.unwrap();

        p.index(&docs).await.unwrap();
        assert_eq!(index.count().await.unwrap(), count_after_first);
    }

    #[tokio::test]
    async fn empty_documents_are_skipped_not_fatal() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let p = pipeline(Arc::new(KeywordEmbedder::new()), index.clone());

        let docs = vec![
            Document::new("empty", "   \n  "),
            Document::new("rules", "A turnover transfers possession of the disc."),
        ];
        let report = p.index(&docs).await.unwrap();

        assert_eq!(report.skipped_documents, 1);
        assert!(report.indexed_chunks >= 1);
    }

    #[tokio::test]
    async fn transient_embedding_failures_are_retried() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let p = pipeline(Arc::new(FlakyEmbedder::failing_times(2)), index.clone());

        let docs = vec![Document::new("rules", "The pull starts play.")];
        let report = p.index(&docs).await.unwrap();
        assert!(report.indexed_chunks >= 1);
    }

    #[tokio::test]
    async fn exhausted_retries_fail_but_keep_prior_documents() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let good = Document::new("good", "The pull starts play.");
        let bad = Document::new("bad", "This one will never embed.");

        // First document indexes fine, second exhausts every retry
        let p = pipeline(Arc::new(FlakyEmbedder::failing_after(1)), index.clone());
        let result = p.index(&[good, bad]).await;

        match result {
            Err(Error::IndexingFailed { document_id, .. }) => assert_eq!(document_id, "bad"),
            other => panic!("expected IndexingFailed, got {:?}", other.map(|_| ())),
        }
        assert!(index.count().await.unwrap() >= 1);
    }

    #[tokio::test]
    async fn permanent_embedding_failure_names_the_document() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let p = pipeline(Arc::new(FailingEmbedder), index);

        let result = p.index(&[Document::new("doc1", "Some text.")]).await;
        assert!(matches!(
            result,
            Err(Error::IndexingFailed { document_id, .. }) if document_id == "doc1"
        ));
    }
}
