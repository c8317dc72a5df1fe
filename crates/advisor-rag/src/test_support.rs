//! Deterministic provider fakes shared by the pipeline tests

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use advisor_core::{ChatProvider, EmbeddingProvider, Error, Result};

/// Terms the fake embedder projects onto. Texts sharing these stems land
/// close together in cosine space; everything else collapses onto a single
/// fallback axis.
const VOCABULARY: &[&str] = &[
    "disc", "bound", "player", "contact", "field", "throw", "score", "goal",
];

/// Keyword-projection embedder: deterministic, dimension `VOCABULARY + 1`.
pub(crate) struct KeywordEmbedder;

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self
    }

    fn project(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; VOCABULARY.len() + 1];
        let lower = text.to_lowercase();
        let mut any_hit = false;
        for token in lower.split_whitespace() {
            for (i, stem) in VOCABULARY.iter().enumerate() {
                if token.contains(stem) {
                    vector[i] += 1.0;
                    any_hit = true;
                }
            }
        }
        if !any_hit {
            vector[VOCABULARY.len()] = 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::project(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::project(t)).collect())
    }

    fn model_id(&self) -> &str {
        "keyword-test-embedder"
    }
}

/// Embedder whose calls fail until (or after) a configured call count.
pub(crate) struct FlakyEmbedder {
    calls: AtomicU32,
    /// Calls with index below this fail (None disables)
    fail_below: Option<u32>,
    /// Calls with index at or above this fail (None disables)
    fail_from: Option<u32>,
}

impl FlakyEmbedder {
    /// Fail the first `n` calls, then behave like [`KeywordEmbedder`]
    pub fn failing_times(n: u32) -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail_below: Some(n),
            fail_from: None,
        }
    }

    /// Succeed for the first `n` calls, then fail every later one
    pub fn failing_after(n: u32) -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail_below: None,
            fail_from: Some(n),
        }
    }

    fn tick(&self) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let fails = self.fail_below.is_some_and(|n| call < n)
            || self.fail_from.is_some_and(|n| call >= n);
        if fails {
            Err(Error::Provider("simulated rate limit".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.tick()?;
        Ok(KeywordEmbedder::project(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.tick()?;
        Ok(texts.iter().map(|t| KeywordEmbedder::project(t)).collect())
    }

    fn model_id(&self) -> &str {
        "flaky-test-embedder"
    }
}

/// Embedder that always fails with a transient provider error.
pub(crate) struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::Provider("embedding backend unavailable".into()))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::Provider("embedding backend unavailable".into()))
    }

    fn model_id(&self) -> &str {
        "failing-test-embedder"
    }
}

/// One recorded chat invocation
#[derive(Clone)]
pub(crate) struct ChatCall {
    pub prompt: String,
    pub context: Vec<String>,
}

enum ChatBehavior {
    Fixed(String),
    EchoContext,
}

/// Chat fake that records every call and returns a canned response.
pub(crate) struct StaticChat {
    behavior: ChatBehavior,
    calls: Mutex<Vec<ChatCall>>,
}

impl StaticChat {
    pub fn answering(response: &str) -> Self {
        Self {
            behavior: ChatBehavior::Fixed(response.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Return the joined context as the "generation"; useful for forcing
    /// non-converging reductions
    pub fn echoing_context() -> Self {
        Self {
            behavior: ChatBehavior::EchoContext,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ChatCall> {
        self.calls.lock().expect("chat call log poisoned").clone()
    }
}

#[async_trait]
impl ChatProvider for StaticChat {
    async fn complete(&self, prompt: &str, context: &[String]) -> Result<String> {
        self.calls
            .lock()
            .expect("chat call log poisoned")
            .push(ChatCall {
                prompt: prompt.to_string(),
                context: context.to_vec(),
            });
        match &self.behavior {
            ChatBehavior::Fixed(response) => Ok(response.clone()),
            ChatBehavior::EchoContext => Ok(context.join(" ")),
        }
    }

    async fn health(&self) -> Result<()> {
        Ok(())
    }

    fn model_id(&self) -> &str {
        "static-test-chat"
    }
}

/// Chat fake that always fails with a transient provider error.
pub(crate) struct FailingChat;

#[async_trait]
impl ChatProvider for FailingChat {
    async fn complete(&self, _prompt: &str, _context: &[String]) -> Result<String> {
        Err(Error::Provider("chat backend unavailable".into()))
    }

    async fn health(&self) -> Result<()> {
        Err(Error::Provider("chat backend unavailable".into()))
    }

    fn model_id(&self) -> &str {
        "failing-test-chat"
    }
}
