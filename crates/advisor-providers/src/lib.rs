//! HTTP provider implementations for Advisor
//!
//! Concrete backends for the `advisor-core` provider traits: an
//! OpenAI-compatible embeddings endpoint (VoyageAI speaks this shape) and
//! the Anthropic messages API for answer synthesis.

mod anthropic;
mod embeddings;

pub use anthropic::AnthropicChat;
pub use embeddings::OpenAiEmbeddings;

// Re-export core types for convenience
pub use advisor_core::{ChatProvider, EmbeddingProvider, Error, Result, Settings};
