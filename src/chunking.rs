//! Chunking utilities for splitting extracted text blocks into overlapping
//! segments.
//!
//! Every block is normalized, then cut into windows of at most
//! `max_chars` characters. Consecutive windows of the same block share
//! `overlap` characters; windows never span two blocks.

use serde::Serialize;

use crate::{
    error::{Error, Result},
    normalize::normalize_numeric_tokens,
};

/// Default maximum chunk length in characters.
pub const DEFAULT_MAX_CHARS: usize = 800;

/// Default overlap between adjacent chunks of one block, in characters.
pub const DEFAULT_OVERLAP: usize = 200;

/// Validated chunking settings.
///
/// # Examples
///
/// ```
/// use finqa::chunking::{ChunkingConfig, DEFAULT_MAX_CHARS};
///
/// let config = ChunkingConfig::default();
/// assert_eq!(config.max_chars(), DEFAULT_MAX_CHARS);
///
/// assert!(ChunkingConfig::new(0, 10).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    max_chars: usize,
    overlap: usize,
}

impl ChunkingConfig {
    /// Build a configuration, rejecting a zero `max_chars`.
    ///
    /// An `overlap` at or above `max_chars` is accepted; the window then
    /// advances by a single character.
    pub fn new(max_chars: usize, overlap: usize) -> Result<Self> {
        if max_chars == 0 {
            return Err(Error::InvalidChunkConfig);
        }
        if overlap >= max_chars {
            tracing::warn!(
                max_chars,
                overlap,
                "overlap is not smaller than max_chars, window step clamped to 1"
            );
        }
        Ok(Self { max_chars, overlap })
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between the starts of two consecutive windows.
    pub fn step(&self) -> usize {
        self.max_chars.saturating_sub(self.overlap).max(1)
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// A retrievable piece of a text block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Normalized, trimmed chunk text.
    pub content: String,
    /// Position of the source block in the chunker input.
    pub block: usize,
}

impl AsRef<str> for Chunk {
    fn as_ref(&self) -> &str {
        &self.content
    }
}

/// Split text blocks into the ordered chunk list that forms a corpus.
///
/// Blocks that are blank after trimming are skipped. Output order is block
/// order, then left-to-right window order.
///
/// # Examples
///
/// ```
/// use finqa::chunking::{chunk_text_blocks, ChunkingConfig};
///
/// let config = ChunkingConfig::new(800, 200).unwrap();
/// let chunks = chunk_text_blocks(&["A".repeat(1000)], &config);
/// assert_eq!(chunks.len(), 2);
/// assert_eq!(chunks[1].content.len(), 400);
/// ```
pub fn chunk_text_blocks<S: AsRef<str>>(
    blocks: &[S],
    config: &ChunkingConfig,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    for (block_idx, block) in blocks.iter().enumerate() {
        let trimmed = block.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }

        let normalized = normalize_numeric_tokens(trimmed);
        for content in split_block(&normalized, config) {
            chunks.push(Chunk {
                content,
                block: block_idx,
            });
        }
    }

    tracing::debug!(
        blocks = blocks.len(),
        chunks = chunks.len(),
        "chunked text blocks"
    );
    chunks
}

fn split_block(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let char_count = text.chars().count();
    if char_count <= config.max_chars() {
        return vec![text.to_string()];
    }

    // Char index -> byte index, with a trailing entry for the end.
    let char_to_byte: Vec<usize> = text
        .char_indices()
        .map(|(byte_idx, _)| byte_idx)
        .chain(std::iter::once(text.len()))
        .collect();

    window_spans(char_count, config)
        .into_iter()
        .filter_map(|(start, end)| {
            let window = text[char_to_byte[start]..char_to_byte[end]].trim();
            (!window.is_empty()).then(|| window.to_string())
        })
        .collect()
}

/// Character spans `[start, end)` of the windows over a block.
fn window_spans(
    char_count: usize,
    config: &ChunkingConfig,
) -> Vec<(usize, usize)> {
    let step = config.step();
    let mut spans = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + config.max_chars()).min(char_count);
        spans.push((start, end));
        if end >= char_count {
            break;
        }
        start += step;
    }

    spans
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn config(max_chars: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig::new(max_chars, overlap).unwrap()
    }

    #[test]
    fn rejects_zero_max_chars() {
        assert!(matches!(
            ChunkingConfig::new(0, 0),
            Err(Error::InvalidChunkConfig)
        ));
    }

    #[test]
    fn step_is_clamped() {
        assert_eq!(config(800, 200).step(), 600);
        assert_eq!(config(10, 10).step(), 1);
        assert_eq!(config(10, 50).step(), 1);
    }

    #[test]
    fn short_block_single_chunk() {
        let chunks =
            chunk_text_blocks(&["  Net Income: 98,765  "], &config(800, 200));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Net Income: 98765");
        assert_eq!(chunks[0].block, 0);
    }

    #[test]
    fn skips_blank_blocks() {
        let chunks = chunk_text_blocks(
            &["", "   \n\t", "Revenue", ""],
            &ChunkingConfig::default(),
        );
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Revenue");
        assert_eq!(chunks[0].block, 2);
    }

    #[test]
    fn thousand_chars_two_windows() {
        let text = "A".repeat(1000);
        let chunks = chunk_text_blocks(&[text.as_str()], &config(800, 200));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, text[0..800]);
        assert_eq!(chunks[1].content, text[600..1000]);
        assert!(chunks.iter().all(|c| c.content.len() <= 800));
    }

    #[test]
    fn spans_stop_once_end_is_covered() {
        assert_eq!(
            window_spans(1000, &config(800, 500)),
            vec![(0, 800), (300, 1000)]
        );
        assert_eq!(window_spans(5, &config(2, 5)).len(), 4);
    }

    #[test]
    fn chunks_never_span_blocks() {
        let blocks = ["first block text", "second block text"];
        let chunks = chunk_text_blocks(&blocks, &config(10, 2));

        assert_eq!(chunks.len(), 4);
        for chunk in &chunks {
            assert!(blocks[chunk.block].contains(&chunk.content));
        }
        let order: Vec<usize> = chunks.iter().map(|c| c.block).collect();
        assert_eq!(order, vec![0, 0, 1, 1]);
    }

    #[test]
    fn windows_are_trimmed() {
        let text = format!("{}   {}", "x".repeat(8), "y".repeat(8));
        let chunks = chunk_text_blocks(&[text.as_str()], &config(10, 0));
        assert_eq!(chunks[0].content, "xxxxxxxx");
        assert!(chunks.iter().all(|c| c.content.trim() == c.content));
    }

    #[test]
    fn handles_multibyte_chars() {
        let text = "café ☕ naïve 日本語 🎉 ".repeat(40);
        let chunks = chunk_text_blocks(&[text.as_str()], &config(50, 10));

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 50);
        }
    }

    #[test]
    fn deterministic_output() {
        let blocks = vec![
            "Total Revenue: 1,234,567 ".repeat(60),
            "Operating expenses rose".to_string(),
        ];
        let a = chunk_text_blocks(&blocks, &ChunkingConfig::default());
        let b = chunk_text_blocks(&blocks, &ChunkingConfig::default());
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn spans_cover_block(
            len in 1usize..3000,
            max_chars in 1usize..900,
            overlap in 0usize..900,
        ) {
            let spans = window_spans(len, &config(max_chars, overlap));
            prop_assert_eq!(spans[0].0, 0);
            prop_assert_eq!(spans.last().unwrap().1, len);
            for pair in spans.windows(2) {
                // The next window starts before the previous one ends.
                prop_assert!(pair[1].0 <= pair[0].1);
                prop_assert!(pair[1].0 > pair[0].0);
            }
        }

        #[test]
        fn chunks_respect_bound(
            text in "[a-z0-9 ,]{0,400}",
            max_chars in 1usize..120,
            overlap in 0usize..120,
        ) {
            let chunks =
                chunk_text_blocks(&[text.as_str()], &config(max_chars, overlap));
            for chunk in &chunks {
                prop_assert!(chunk.content.chars().count() <= max_chars);
                prop_assert!(!chunk.content.is_empty());
            }
        }
    }
}
