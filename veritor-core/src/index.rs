//! In-memory vector index over the corpus.
//!
//! One L2-normalized vector per document, built atomically at construction
//! and read-only thereafter. Nearest-neighbor search is cosine similarity,
//! which over normalized vectors reduces to a dot product.

use crate::corpus::Corpus;
use crate::embeddings::{Embedder, normalize};

/// A scored search hit: corpus position plus cosine similarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexHit {
    pub position: usize,
    pub score: f32,
}

/// Dense vector index; position i corresponds to corpus document i.
#[derive(Debug)]
pub struct VectorIndex {
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
}

impl VectorIndex {
    /// Encode every corpus document once and build the index.
    ///
    /// The index is only ever visible fully built: construction returns a
    /// complete value or nothing.
    pub fn build(corpus: &Corpus, embedder: &dyn Embedder) -> Self {
        let texts: Vec<&str> = corpus.documents().iter().map(|d| d.text.as_str()).collect();
        let mut vectors = embedder.encode_batch(&texts);
        for v in &mut vectors {
            normalize(v);
        }
        Self {
            vectors,
            dimensions: embedder.dimensions(),
        }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Return the top `k` documents by cosine similarity to `query`,
    /// descending. Ties keep insertion order (stable sort), and `k` is
    /// silently clipped to the index size.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<IndexHit> {
        let mut query = query.to_vec();
        normalize(&mut query);

        let mut hits: Vec<IndexHit> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, v)| IndexHit {
                position,
                score: dot(&query, v),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k.min(self.vectors.len()));
        hits
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusDocument;
    use crate::embeddings::HashEmbedder;

    fn corpus(texts: &[&str]) -> Corpus {
        Corpus::from_documents(
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| CorpusDocument {
                    id: format!("doc-{i}"),
                    text: (*t).to_string(),
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_index_size_matches_corpus() {
        let corpus = corpus(&[
            "SpaceX was founded by Elon Musk in 2002.",
            "The Eiffel Tower is located in Paris.",
            "Water boils at 100 degrees Celsius at sea level.",
        ]);
        let embedder = HashEmbedder::new(256);
        let index = VectorIndex::build(&corpus, &embedder);
        assert_eq!(index.len(), corpus.len());
        assert_eq!(index.dimensions(), 256);
    }

    #[test]
    fn test_search_clips_k_to_corpus_size() {
        let corpus = corpus(&["alpha beta gamma", "delta epsilon zeta"]);
        let embedder = HashEmbedder::new(128);
        let index = VectorIndex::build(&corpus, &embedder);
        let query = embedder.encode("alpha beta");
        assert_eq!(index.search(&query, 50).len(), 2);
    }

    #[test]
    fn test_search_descending_similarity() {
        let corpus = corpus(&[
            "cats are small furry animals",
            "rust is a systems programming language",
            "cats and dogs are common household pets",
        ]);
        let embedder = HashEmbedder::new(512);
        let index = VectorIndex::build(&corpus, &embedder);
        let hits = index.search(&embedder.encode("furry cats"), 3);
        assert_eq!(hits.len(), 3);
        assert!(hits[0].score >= hits[1].score);
        assert!(hits[1].score >= hits[2].score);
        // The cat passages should outrank the unrelated one.
        assert_ne!(hits[2].position, 0);
    }

    #[test]
    fn test_search_ties_keep_insertion_order() {
        // Identical documents score identically; stable sort keeps positions
        // in insertion order.
        let corpus = corpus(&["same text here", "same text here", "same text here"]);
        let embedder = HashEmbedder::new(128);
        let index = VectorIndex::build(&corpus, &embedder);
        let hits = index.search(&embedder.encode("same text here"), 3);
        let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_search_zero_query_scores_zero() {
        let corpus = corpus(&["anything at all"]);
        let embedder = HashEmbedder::new(128);
        let index = VectorIndex::build(&corpus, &embedder);
        let hits = index.search(&vec![0.0; 128], 1);
        assert_eq!(hits[0].score, 0.0);
    }
}
