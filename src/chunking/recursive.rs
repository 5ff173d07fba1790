//! Separator-aware character splitting.
//!
//! Each window of `max_size` characters is cut after the last paragraph
//! break, line break, sentence end or space it contains, in that order of
//! preference, and hard-cut at the limit when none of them is usable.

use super::{char_offsets, Chunker, ChunkingConfig, TextSpan};

/// Separators tried from coarsest to finest.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " "];

/// A cut must keep at least 1/MIN_FILL_DIVISOR of the window.
const MIN_FILL_DIVISOR: usize = 4;

/// Splits text on natural boundaries without dropping any characters.
#[derive(Debug, Clone, Default)]
pub struct RecursiveChunker;

impl RecursiveChunker {
    pub fn new() -> Self {
        Self
    }

    /// Character length of the best cut within `window`, if any separator qualifies.
    fn find_cut(window: &str, window_chars: usize) -> Option<usize> {
        let min_fill = (window_chars / MIN_FILL_DIVISOR).max(1);

        SEPARATORS.iter().find_map(|sep| {
            let byte_pos = window.rfind(sep)? + sep.len();
            let chars = window[..byte_pos].chars().count();
            (chars >= min_fill).then_some(chars)
        })
    }
}

impl Chunker for RecursiveChunker {
    fn split(&self, text: &str, config: &ChunkingConfig) -> Vec<TextSpan> {
        let offsets = char_offsets(text);
        let total = offsets.len() - 1;
        let max_size = config.max_size.max(1);
        let overlap = config.overlap.min(max_size - 1);

        let mut spans = Vec::new();
        let mut start = 0;

        while start < total {
            let limit = start + max_size;
            if limit >= total {
                spans.push(TextSpan { start, end: total });
                break;
            }

            let window = &text[offsets[start]..offsets[limit]];
            let end = match Self::find_cut(window, max_size) {
                Some(chars) => start + chars,
                None => limit,
            };
            spans.push(TextSpan { start, end });

            start = if end - start > overlap { end - overlap } else { end };
        }

        spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;
    use crate::loader::RawDocument;

    fn config(max_size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig { max_size, overlap }
    }

    /// Rebuild a document from its chunks, dropping overlapped prefixes.
    fn reconstruct(chunks: &[Chunk]) -> String {
        let mut out = String::new();
        let mut covered = 0;
        for chunk in chunks {
            let skip = covered - chunk.start;
            out.extend(chunk.content.chars().skip(skip));
            covered = chunk.end;
        }
        out
    }

    fn sample_text() -> String {
        let paragraph = "Reliance Industries reported a consolidated net profit of Rs 19,000 cr. \
Revenue from operations grew on the back of retail and telecom. \
Analysts expect margins to stay stable next quarter.";
        vec![paragraph; 12].join("\n\n")
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let spans = RecursiveChunker::new().split("NIFTY closed higher.", &config(1000, 0));
        assert_eq!(spans, vec![TextSpan { start: 0, end: 20 }]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(RecursiveChunker::new().split("", &config(10, 0)).is_empty());
    }

    #[test]
    fn test_bounds_and_lossless() {
        let text = sample_text();
        let docs = vec![
            RawDocument::new("https://screener.in/a", text.clone()),
            RawDocument::new("https://groww.in/b", "₹ symbols ₹ and multibyte ₹ ".repeat(40)),
        ];

        for max_size in [7, 50, 200, 1000] {
            let chunks = RecursiveChunker::new().chunk_documents(&docs, &config(max_size, 0));

            for chunk in &chunks {
                assert!(chunk.content.chars().count() <= max_size);
                assert_eq!(chunk.content.chars().count(), chunk.len());
            }
            for (i, doc) in docs.iter().enumerate() {
                let own: Vec<Chunk> =
                    chunks.iter().filter(|c| c.document_index == i).cloned().collect();
                assert_eq!(reconstruct(&own), doc.content);
                let joined: String = own.iter().map(|c| c.content.as_str()).collect();
                assert_eq!(joined, doc.content);
            }
        }
    }

    #[test]
    fn test_ordering_follows_documents() {
        let docs = vec![
            RawDocument::new("https://a.in", "a ".repeat(300)),
            RawDocument::new("https://b.in", "b ".repeat(300)),
        ];
        let chunks = RecursiveChunker::new().chunk_documents(&docs, &config(100, 0));

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.order, i);
        }
        let first_b = chunks.iter().position(|c| c.document_index == 1).unwrap();
        assert!(chunks[..first_b].iter().all(|c| c.document_index == 0));
        assert!(chunks[first_b..].iter().all(|c| c.document_index == 1));
        assert_eq!(chunks[first_b].position, 0);
        assert_eq!(chunks[first_b].source_url, "https://b.in");
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let text = format!("{}\n\n{}", "x".repeat(60), "y".repeat(60));
        let spans = RecursiveChunker::new().split(&text, &config(100, 0));
        assert_eq!(spans[0], TextSpan { start: 0, end: 62 });
        assert_eq!(spans[1], TextSpan { start: 62, end: 122 });
    }

    #[test]
    fn test_hard_cut_without_separators() {
        let text = "z".repeat(25);
        let spans = RecursiveChunker::new().split(&text, &config(10, 0));
        let lengths: Vec<usize> = spans.iter().map(|s| s.end - s.start).collect();
        assert_eq!(lengths, vec![10, 10, 5]);
    }

    #[test]
    fn test_overlap_repeats_tail() {
        let text = "0123456789".repeat(5);
        let docs = vec![RawDocument::new("https://nse.in", text.clone())];
        let chunks = RecursiveChunker::new().chunk_documents(&docs, &config(20, 5));

        assert!(chunks.len() > 2);
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end - pair[1].start, 5);
        }
        assert!(chunks.iter().all(|c| c.len() <= 20));
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_no_documents() {
        let chunks = RecursiveChunker::new().chunk_documents(&[], &ChunkingConfig::default());
        assert!(chunks.is_empty());
    }
}
