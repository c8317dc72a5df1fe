//! Embedding provider trait

use async_trait::async_trait;

use crate::Result;

/// Trait for embedding providers (e.g., VoyageAI, OpenAI-compatible, etc.)
///
/// Maps text to fixed-length numeric vectors. The output dimension is not
/// configured up front: it is auto-detected by probing the model once, and
/// the vector index enforces it from the first write onward.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, preserving input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Output dimension of this provider, probed with a throwaway embedding
    async fn dimension(&self) -> Result<usize> {
        let probe = self.embed("__dim_probe__").await?;
        Ok(probe.len())
    }

    /// Identifier of the embedding model in use
    fn model_id(&self) -> &str;
}
