//! In-memory vector index

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use advisor_core::{ChunkRecord, Error, Result, ScoredChunk, VectorIndex};

/// Exact-scan vector index held in memory.
///
/// Cosine similarity over raw stored vectors, descending order, ties broken
/// by insertion order (the scan is a stable sort over the insertion
/// sequence). The first upsert fixes the collection dimension; `clear`
/// resets it. Upserts are keyed by chunk id, so re-indexing a document
/// replaces its chunks in place.
pub struct InMemoryVectorIndex {
    inner: Arc<RwLock<IndexInner>>,
}

#[derive(Default)]
struct IndexInner {
    entries: Vec<StoredChunk>,
    by_id: HashMap<String, usize>,
    dimension: Option<usize>,
}

struct StoredChunk {
    chunk: ChunkRecord,
    vector: Vec<f32>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(IndexInner::default())),
        }
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }

    fn insert(inner: &mut IndexInner, chunk: ChunkRecord, vector: Vec<f32>) -> Result<()> {
        match inner.dimension {
            Some(expected) if vector.len() != expected => {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
            None => inner.dimension = Some(vector.len()),
            _ => {}
        }

        match inner.by_id.get(&chunk.chunk_id) {
            Some(&pos) => {
                // Replace in place so insertion order (and tie-breaking)
                // stays stable across re-indexing
                inner.entries[pos] = StoredChunk { chunk, vector };
            }
            None => {
                inner
                    .by_id
                    .insert(chunk.chunk_id.clone(), inner.entries.len());
                inner.entries.push(StoredChunk { chunk, vector });
            }
        }
        Ok(())
    }
}

impl Default for InMemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, chunk: ChunkRecord, vector: Vec<f32>) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| Error::VectorIndex(format!("lock error: {}", e)))?;
        Self::insert(&mut inner, chunk, vector)
    }

    async fn upsert_batch(&self, items: Vec<(ChunkRecord, Vec<f32>)>) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| Error::VectorIndex(format!("lock error: {}", e)))?;
        for (chunk, vector) in items {
            Self::insert(&mut inner, chunk, vector)?;
        }
        Ok(())
    }

    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredChunk>> {
        let inner = self
            .inner
            .read()
            .map_err(|e| Error::VectorIndex(format!("lock error: {}", e)))?;

        let mut results: Vec<ScoredChunk> = inner
            .entries
            .iter()
            .map(|stored| ScoredChunk {
                chunk: stored.chunk.clone(),
                score: Self::cosine_similarity(vector, &stored.vector),
            })
            .collect();

        // Stable sort keeps insertion order for equal scores
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        let inner = self
            .inner
            .read()
            .map_err(|e| Error::VectorIndex(format!("lock error: {}", e)))?;
        Ok(inner.entries.len())
    }

    async fn clear(&self) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| Error::VectorIndex(format!("lock error: {}", e)))?;
        *inner = IndexInner::default();
        Ok(())
    }

    async fn dimension(&self) -> Result<Option<usize>> {
        let inner = self
            .inner
            .read()
            .map_err(|e| Error::VectorIndex(format!("lock error: {}", e)))?;
        Ok(inner.dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str) -> ChunkRecord {
        ChunkRecord {
            chunk_id: id.to_string(),
            source_document_id: "doc".to_string(),
            text: format!("text for {}", id),
            sequence_index: 0,
            page_number: None,
            metadata: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn first_upsert_fixes_the_dimension() {
        let index = InMemoryVectorIndex::new();
        assert_eq!(index.dimension().await.unwrap(), None);

        index.upsert(chunk("a"), vec![1.0, 0.0, 0.0]).await.unwrap();
        assert_eq!(index.dimension().await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn wrong_dimension_fails_without_mutating() {
        let index = InMemoryVectorIndex::new();
        index.upsert(chunk("a"), vec![1.0, 0.0, 0.0]).await.unwrap();

        let result = index.upsert(chunk("b"), vec![1.0, 0.0]).await;
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch { expected: 3, actual: 2 })
        ));
        assert_eq!(index.count().await.unwrap(), 1);
        assert_eq!(index.dimension().await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn search_ranks_by_cosine_descending() {
        let index = InMemoryVectorIndex::new();
        index.upsert(chunk("far"), vec![0.0, 1.0]).await.unwrap();
        index.upsert(chunk("near"), vec![1.0, 0.1]).await.unwrap();
        index.upsert(chunk("mid"), vec![1.0, 1.0]).await.unwrap();

        let results = index.search(&[1.0, 0.0], 10).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.chunk.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(results.iter().all(|r| (-1.0..=1.0).contains(&r.score)));
    }

    #[tokio::test]
    async fn ties_break_by_insertion_order() {
        let index = InMemoryVectorIndex::new();
        index.upsert(chunk("first"), vec![1.0, 0.0]).await.unwrap();
        index.upsert(chunk("second"), vec![2.0, 0.0]).await.unwrap();
        index.upsert(chunk("third"), vec![0.5, 0.0]).await.unwrap();

        // All three are parallel to the query, so scores tie at 1.0
        let results = index.search(&[1.0, 0.0], 10).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.chunk.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn search_respects_limit() {
        let index = InMemoryVectorIndex::new();
        for i in 0..10 {
            index
                .upsert(chunk(&format!("c{}", i)), vec![1.0, i as f32])
                .await
                .unwrap();
        }
        let results = index.search(&[1.0, 0.0], 4).await.unwrap();
        assert_eq!(results.len(), 4);
    }

    #[tokio::test]
    async fn upsert_is_idempotent_per_chunk_id() {
        let index = InMemoryVectorIndex::new();
        index.upsert(chunk("a"), vec![1.0, 0.0]).await.unwrap();
        index.upsert(chunk("a"), vec![0.0, 1.0]).await.unwrap();

        assert_eq!(index.count().await.unwrap(), 1);
        let results = index.search(&[0.0, 1.0], 1).await.unwrap();
        assert!(results[0].score > 0.99);
    }

    #[tokio::test]
    async fn clear_is_idempotent_and_resets_the_dimension() {
        let index = InMemoryVectorIndex::new();
        index.upsert(chunk("a"), vec![1.0, 0.0, 0.0]).await.unwrap();

        index.clear().await.unwrap();
        index.clear().await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
        assert_eq!(index.dimension().await.unwrap(), None);

        // A different dimension is acceptable after a clear
        index.upsert(chunk("b"), vec![1.0, 0.0]).await.unwrap();
        assert_eq!(index.dimension().await.unwrap(), Some(2));
    }
}
