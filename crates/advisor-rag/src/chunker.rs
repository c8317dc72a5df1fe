//! Sentence-aware document chunker

use regex::Regex;

use advisor_core::{ChunkerConfig, Error, Result};

/// Splits document text into overlapping chunks bounded by a token budget.
///
/// Tokens are whitespace-delimited words; chunk text is the token sequence
/// re-joined with single spaces, so chunking is a whitespace-normalizing
/// transform. Cuts land preferentially at paragraph boundaries, then at
/// sentence boundaries, and only fall back to a hard token cut when a
/// single sentence is wider than the window. The last `chunk_overlap`
/// tokens of each chunk reappear at the start of the next one, so no
/// sentence boundary information is lost at a cut point.
///
/// Each call to [`split`](SentenceChunker::split) is independent; the
/// chunker holds no per-document state.
pub struct SentenceChunker {
    config: ChunkerConfig,
    boundary: Regex,
}

struct Sentence {
    tokens: Vec<String>,
    ends_paragraph: bool,
}

impl SentenceChunker {
    /// Create a chunker, validating that the overlap leaves room for new
    /// content in every chunk.
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(Error::Configuration(
                "chunk_size must be at least 1 token".to_string(),
            ));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(Error::Configuration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }

        let mut terminators = String::from(r"\.!\?");
        if let Some(c) = config.sentence_separator.trim().chars().next() {
            if !".!?".contains(c) {
                terminators.push_str(&regex::escape(&c.to_string()));
            }
        }
        let pattern = format!(r#"[{}]["')\]]*$"#, terminators);
        let boundary = Regex::new(&pattern)
            .map_err(|e| Error::Configuration(format!("invalid sentence boundary: {}", e)))?;

        Ok(Self { config, boundary })
    }

    /// Split a document into ordered chunk texts.
    ///
    /// Fails with [`Error::EmptyDocument`] when the input has no
    /// extractable text.
    pub fn split(&self, text: &str) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            return Err(Error::EmptyDocument);
        }

        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut chunks: Vec<String> = Vec::new();
        let mut current: Vec<String> = Vec::new();
        // Prefix of `current` repeated from the previously emitted chunk
        let mut carry_len = 0usize;
        // Index into `current` just past the last completed paragraph
        let mut paragraph_break: Option<usize> = None;

        for sentence in self.sentences(text) {
            let mut rest: &[String] = &sentence.tokens;
            while !rest.is_empty() {
                let room = size.saturating_sub(current.len());
                if rest.len() <= room {
                    current.extend(rest.iter().cloned());
                    rest = &[];
                } else if current.len() > carry_len {
                    // Overflow with real content buffered: cut at the last
                    // paragraph break inside this chunk if there is one,
                    // otherwise at the last sentence end.
                    let at = paragraph_break
                        .filter(|&p| p > carry_len)
                        .unwrap_or(current.len());
                    carry_len = Self::close(&mut chunks, &mut current, at, overlap);
                    paragraph_break = None;
                } else {
                    // A single sentence wider than the window: hard token cut
                    let take = room.max(1);
                    current.extend(rest[..take].iter().cloned());
                    rest = &rest[take..];
                    let at = current.len();
                    carry_len = Self::close(&mut chunks, &mut current, at, overlap);
                    paragraph_break = None;
                }
            }
            if sentence.ends_paragraph {
                paragraph_break = Some(current.len());
            }
        }

        if current.len() > carry_len {
            chunks.push(current.join(" "));
        }

        Ok(chunks)
    }

    /// Emit `current[..at]` as a chunk and reopen the buffer with the
    /// overlap tokens followed by whatever was buffered past the cut.
    /// Returns the new carry length.
    fn close(chunks: &mut Vec<String>, current: &mut Vec<String>, at: usize, overlap: usize) -> usize {
        let remainder = current.split_off(at);
        chunks.push(current.join(" "));

        let carry_start = current.len().saturating_sub(overlap);
        let mut next: Vec<String> = current[carry_start..].to_vec();
        let carry_len = next.len();
        next.extend(remainder);
        *current = next;
        carry_len
    }

    fn sentences(&self, text: &str) -> Vec<Sentence> {
        let mut out = Vec::new();
        for paragraph in text.split(&self.config.paragraph_separator) {
            let start = out.len();
            let mut cur: Vec<String> = Vec::new();
            for token in paragraph.split_whitespace() {
                cur.push(token.to_string());
                if self.boundary.is_match(token) {
                    out.push(Sentence {
                        tokens: std::mem::take(&mut cur),
                        ends_paragraph: false,
                    });
                }
            }
            if !cur.is_empty() {
                out.push(Sentence {
                    tokens: cur,
                    ends_paragraph: false,
                });
            }
            if out.len() > start {
                if let Some(last) = out.last_mut() {
                    last.ends_paragraph = true;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(chunk_size: usize, chunk_overlap: usize) -> SentenceChunker {
        SentenceChunker::new(ChunkerConfig {
            chunk_size,
            chunk_overlap,
            ..ChunkerConfig::default()
        })
        .unwrap()
    }

    fn tokens(chunk: &str) -> Vec<&str> {
        chunk.split_whitespace().collect()
    }

    fn normalized(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Concatenate chunks with the overlap prefix removed from each chunk
    /// after the first.
    fn reconstruct(chunks: &[String], overlap: usize) -> String {
        let mut out: Vec<&str> = Vec::new();
        let mut prev_len = 0usize;
        for (i, chunk) in chunks.iter().enumerate() {
            let toks = tokens(chunk);
            let skip = if i == 0 { 0 } else { overlap.min(prev_len) };
            out.extend(&toks[skip..]);
            prev_len = toks.len();
        }
        out.join(" ")
    }

    #[test]
    fn empty_document_is_an_error() {
        let c = chunker(16, 4);
        assert!(matches!(c.split(""), Err(Error::EmptyDocument)));
        assert!(matches!(c.split("   \n\t  "), Err(Error::EmptyDocument)));
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let result = SentenceChunker::new(ChunkerConfig {
            chunk_size: 10,
            chunk_overlap: 10,
            ..ChunkerConfig::default()
        });
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn short_text_yields_one_normalized_chunk() {
        let c = chunker(64, 8);
        let chunks = c
            .split("The disc   is out\nof bounds when it contacts anything.")
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(
            chunks[0],
            "The disc is out of bounds when it contacts anything."
        );
    }

    #[test]
    fn round_trip_reconstructs_normalized_text() {
        let text = "The pull starts play. Each point begins with both teams lining up. \
                    The disc is out of bounds when it contacts anything other than a player in bounds. \
                    A turnover transfers possession of the disc. The stall count reaches ten and play stops. \
                    Fouls are resolved by returning the disc to the thrower.";
        for (size, overlap) in [(12, 3), (20, 5), (9, 2)] {
            let c = chunker(size, overlap);
            let chunks = c.split(text).unwrap();
            assert!(chunks.len() > 1);
            assert_eq!(reconstruct(&chunks, overlap), normalized(text));
        }
    }

    #[test]
    fn chunks_respect_token_budget() {
        let c = chunker(10, 2);
        let text = "one two three four five six seven. eight nine ten eleven twelve. \
                    thirteen fourteen fifteen sixteen seventeen eighteen nineteen twenty.";
        for chunk in c.split(text).unwrap() {
            assert!(tokens(&chunk).len() <= 10);
        }
    }

    #[test]
    fn overlap_tokens_reappear_in_the_next_chunk() {
        let c = chunker(8, 3);
        let text = "alpha beta gamma delta epsilon. zeta eta theta iota kappa. \
                    lambda mu nu xi omicron. pi rho sigma tau upsilon.";
        let chunks = c.split(text).unwrap();
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let prev = tokens(&pair[0]);
            let next = tokens(&pair[1]);
            let carry = 3.min(prev.len());
            assert_eq!(&prev[prev.len() - carry..], &next[..carry]);
        }
    }

    #[test]
    fn unbroken_text_falls_back_to_hard_cuts() {
        let words: Vec<String> = (0..40).map(|i| format!("w{}", i)).collect();
        let c = chunker(10, 2);
        let chunks = c.split(&words.join(" ")).unwrap();
        assert!(chunks.len() >= 4);
        for chunk in &chunks {
            assert!(tokens(chunk).len() <= 10);
        }
        assert_eq!(reconstruct(&chunks, 2), words.join(" "));
    }

    #[test]
    fn cut_prefers_paragraph_boundary() {
        let config = ChunkerConfig {
            chunk_size: 10,
            chunk_overlap: 2,
            ..ChunkerConfig::default()
        };
        let sep = config.paragraph_separator.clone();
        let c = SentenceChunker::new(config).unwrap();

        let para1 = "one two three four five six.";
        let para2 = "seven eight nine ten eleven twelve thirteen fourteen.";
        let chunks = c.split(&format!("{}{}{}", para1, sep, para2)).unwrap();

        // The first cut lands at the end of paragraph one even though more
        // tokens would still have fit in the window.
        assert_eq!(chunks[0], normalized(para1));
        assert!(tokens(&chunks[1]).starts_with(&["five", "six."]));
    }
}
