//! Chat provider trait

use async_trait::async_trait;

use crate::Result;

/// Trait for chat/completion providers (e.g., Anthropic, watsonx, etc.)
///
/// The synthesis layer builds prompts that already carry the retrieval
/// context; providers only need to turn one prompt plus optional context
/// blocks into generated text.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Generate a completion for a prompt with optional context chunks.
    ///
    /// Context chunks are presented to the model verbatim, before the
    /// prompt. An empty slice is valid: the prompt contract requires the
    /// model to say when the material does not cover the question instead
    /// of inventing an answer.
    async fn complete(&self, prompt: &str, context: &[String]) -> Result<String>;

    /// Cheap reachability check used by the health endpoint
    async fn health(&self) -> Result<()>;

    /// Identifier of the chat model in use
    fn model_id(&self) -> &str;
}
