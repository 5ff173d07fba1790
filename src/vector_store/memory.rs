//! Per-query in-memory vector index.
//!
//! Built once from the embedded chunks of one request and dropped with it.

use super::{cosine_similarity, EmbeddedChunk, RetrievedChunk};
use crate::error::{FinragError, Result};
use std::cmp::Ordering;

/// Immutable snapshot of embedded chunks supporting top-k search.
#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<EmbeddedChunk>,
}

impl VectorIndex {
    /// Build an index. Entries are kept in chunk order.
    pub fn build(mut entries: Vec<EmbeddedChunk>) -> Self {
        entries.sort_by_key(|e| e.chunk.order);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the `k` most similar chunks, best first.
    ///
    /// Equal scores keep chunk order. Returns fewer than `k` results when the
    /// index is smaller, and nothing when it is empty.
    pub fn query(&self, query_embedding: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Err(FinragError::InvalidInput(
                "k must be at least 1".to_string(),
            ));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let score = cosine_similarity(query_embedding, &entry.embedding);
                (i, if score.is_nan() { f32::NEG_INFINITY } else { score })
            })
            .collect();

        scored.sort_by(|(ia, a), (ib, b)| {
            b.partial_cmp(a)
                .unwrap_or(Ordering::Equal)
                .then_with(|| ia.cmp(ib))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| RetrievedChunk {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;

    fn entry(order: usize, content: &str, embedding: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk {
            chunk: Chunk {
                document_index: 0,
                source_url: "https://moneycontrol.com/x".to_string(),
                order,
                position: order,
                content: content.to_string(),
                start: 0,
                end: content.chars().count(),
            },
            embedding,
        }
    }

    fn three() -> VectorIndex {
        VectorIndex::build(vec![
            entry(0, "dividends", vec![1.0, 0.0, 0.0]),
            entry(1, "earnings", vec![0.6, 0.8, 0.0]),
            entry(2, "debt", vec![0.0, 0.0, 1.0]),
        ])
    }

    #[test]
    fn test_top_one_is_most_similar() {
        let results = three().query(&[0.5, 0.9, 0.0], 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.content, "earnings");
    }

    #[test]
    fn test_returns_min_k_n() {
        let index = three();
        assert_eq!(index.query(&[1.0, 0.0, 0.0], 2).unwrap().len(), 2);
        assert_eq!(index.query(&[1.0, 0.0, 0.0], 10).unwrap().len(), 3);

        let scores: Vec<f32> = index
            .query(&[1.0, 0.0, 0.0], 3)
            .unwrap()
            .iter()
            .map(|r| r.score)
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_empty_index() {
        let index = VectorIndex::build(Vec::new());
        assert!(index.is_empty());
        assert!(index.query(&[1.0, 0.0], 1).unwrap().is_empty());
    }

    #[test]
    fn test_zero_k_rejected() {
        let err = three().query(&[1.0, 0.0, 0.0], 0).unwrap_err();
        assert!(matches!(err, FinragError::InvalidInput(_)));
    }

    #[test]
    fn test_ties_keep_chunk_order() {
        let index = VectorIndex::build(vec![
            entry(2, "later", vec![1.0, 0.0]),
            entry(0, "earliest", vec![2.0, 0.0]),
            entry(1, "middle", vec![0.5, 0.0]),
        ]);

        let results = index.query(&[1.0, 0.0], 3).unwrap();
        let order: Vec<usize> = results.iter().map(|r| r.chunk.order).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_nan_scores_rank_last() {
        let index = VectorIndex::build(vec![
            entry(0, "nan", vec![f32::NAN, 0.0]),
            entry(1, "fine", vec![0.1, 1.0]),
        ]);
        let results = index.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].chunk.content, "fine");
    }
}
