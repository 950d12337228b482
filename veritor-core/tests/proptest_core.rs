//! Property-based tests for core components using proptest.

use proptest::prelude::*;

use veritor_core::cache::normalize_query;
use veritor_core::corpus::{Corpus, CorpusDocument};
use veritor_core::embeddings::{Embedder, HashEmbedder, cosine_similarity};
use veritor_core::index::VectorIndex;
use veritor_core::scorer::keywords;
use veritor_core::types::Verdict;

fn corpus_texts() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,12}( [a-z]{1,12}){0,8}", 1..12)
}

fn build_corpus(texts: &[String]) -> Corpus {
    Corpus::from_documents(
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| CorpusDocument {
                id: format!("doc-{i}"),
                text: t.clone(),
            })
            .collect(),
    )
    .unwrap()
}

proptest! {
    // --- Index properties ---

    #[test]
    fn index_size_always_matches_corpus(texts in corpus_texts()) {
        let corpus = build_corpus(&texts);
        let embedder = HashEmbedder::new(128);
        let index = VectorIndex::build(&corpus, &embedder);
        prop_assert_eq!(index.len(), corpus.len());
    }

    #[test]
    fn search_never_exceeds_corpus_size(texts in corpus_texts(), k in 0usize..64) {
        let corpus = build_corpus(&texts);
        let embedder = HashEmbedder::new(128);
        let index = VectorIndex::build(&corpus, &embedder);
        let hits = index.search(&embedder.encode("probe query"), k);
        prop_assert!(hits.len() <= corpus.len());
        prop_assert!(hits.len() <= k);
    }

    #[test]
    fn search_scores_descending(texts in corpus_texts(), query in "[a-z]{1,12}( [a-z]{1,12}){0,5}") {
        let corpus = build_corpus(&texts);
        let embedder = HashEmbedder::new(128);
        let index = VectorIndex::build(&corpus, &embedder);
        let hits = index.search(&embedder.encode(&query), corpus.len());
        for pair in hits.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }

    // --- Embedding properties ---

    #[test]
    fn encode_is_unit_norm_or_zero(text in ".{0,80}") {
        let embedder = HashEmbedder::new(128);
        let v = embedder.encode(&text);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        prop_assert!(norm == 0.0 || (norm - 1.0).abs() < 0.01);
    }

    #[test]
    fn cosine_is_bounded(a in "[a-z ]{1,40}", b in "[a-z ]{1,40}") {
        let embedder = HashEmbedder::new(128);
        let sim = cosine_similarity(&embedder.encode(&a), &embedder.encode(&b));
        prop_assert!((-1.0001..=1.0001).contains(&sim));
    }

    #[test]
    fn self_similarity_is_one_for_nonempty(text in "[a-z]{3,12}( [a-z]{3,12}){0,5}") {
        let embedder = HashEmbedder::new(256);
        let v = embedder.encode(&text);
        prop_assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-4);
    }

    // --- Keyword properties ---

    #[test]
    fn keywords_are_informative_and_unique(text in ".{0,120}") {
        let keys = keywords(&text);
        for k in &keys {
            prop_assert!(k.len() > 2);
            prop_assert_eq!(k.to_lowercase(), k.clone());
        }
        let mut deduped = keys.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), keys.len());
    }

    // --- Normalization properties ---

    #[test]
    fn normalize_query_is_idempotent(query in ".{0,60}") {
        let once = normalize_query(&query);
        prop_assert_eq!(normalize_query(&once), once.clone());
    }

    // --- Verdict properties ---

    #[test]
    fn verdict_is_monotone_in_confidence(
        low in 0.0f64..50.0,
        high in 50.0f64..100.0,
        yellow in 0.0f64..0.5,
        green in 0.5f64..1.0,
    ) {
        let rank = |v: Verdict| match v {
            Verdict::Unverifiable => 0,
            Verdict::HallucinationSuspected => 1,
            Verdict::Verified => 2,
        };
        let lower = Verdict::grade(low, green, yellow);
        let higher = Verdict::grade(high, green, yellow);
        prop_assert!(rank(higher) >= rank(lower));
    }
}
