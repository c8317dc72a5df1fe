//! Tree-summarize answer synthesis

use serde::{Deserialize, Serialize};
use tracing::debug;

use advisor_core::{with_retry, ChatProvider, Result, RetryConfig};

/// Bounds for the hierarchical reduction over context chunks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Rough character budget for the context portion of one prompt
    pub max_prompt_chars: usize,
    /// Upper bound on chunks combined in one summarization call
    pub max_batch_chunks: usize,
    /// Hard cap on reduction rounds; after this the final answer is
    /// produced from whatever summaries remain
    pub max_rounds: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_prompt_chars: 8000,
            max_batch_chunks: 5,
            max_rounds: 4,
        }
    }
}

/// Synthesize one grounded answer from retrieved context chunks.
///
/// Chunks are packed into batches within the prompt budget, each batch is
/// summarized independently against the question, and the summaries are
/// re-batched until a single prompt remains. An empty context still goes
/// through the final call: the prompt requires the model to say when the
/// material does not cover the question rather than invent an answer.
pub async fn tree_summarize<C: ChatProvider>(
    chat: &C,
    config: &SynthesisConfig,
    retry: &RetryConfig,
    question: &str,
    mut contexts: Vec<String>,
) -> Result<String> {
    let mut round = 0;
    while !fits_in_one_prompt(&contexts, config) && round < config.max_rounds {
        let batches = pack_batches(contexts, config);
        debug!(round, batches = batches.len(), "tree-summarize reduction");

        let mut summaries = Vec::with_capacity(batches.len());
        for batch in &batches {
            let prompt = summary_prompt(question);
            let summary =
                with_retry(retry, "summary generation", || chat.complete(&prompt, batch)).await?;
            summaries.push(summary);
        }
        contexts = summaries;
        round += 1;
    }

    let prompt = answer_prompt(question);
    with_retry(retry, "answer generation", || {
        chat.complete(&prompt, &contexts)
    })
    .await
}

fn fits_in_one_prompt(contexts: &[String], config: &SynthesisConfig) -> bool {
    contexts.len() <= config.max_batch_chunks
        && contexts.iter().map(|c| c.len()).sum::<usize>() <= config.max_prompt_chars
}

/// Greedy packing: each batch stays within the prompt budget and the batch
/// size cap; an oversized single chunk still forms a batch of its own.
fn pack_batches(contexts: Vec<String>, config: &SynthesisConfig) -> Vec<Vec<String>> {
    let mut batches: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_chars = 0usize;

    for context in contexts {
        let overflow = !current.is_empty()
            && (current.len() >= config.max_batch_chunks
                || current_chars + context.len() > config.max_prompt_chars);
        if overflow {
            batches.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        current_chars += context.len();
        current.push(context);
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

fn summary_prompt(question: &str) -> String {
    format!(
        "Condense the context above into a short summary that keeps every \
         detail relevant to answering this question, and nothing else.\n\
         Question: {}",
        question
    )
}

fn answer_prompt(question: &str) -> String {
    format!(
        "Answer the question using only the context above. If the context \
         does not contain the answer, say that the provided material does \
         not cover this question; do not guess.\n\
         Question: {}",
        question
    )
}
