//! Retrieval engine: corpus k-NN search with external fallback and cache.
//!
//! Owns the corpus index and the fallback cache for the process lifetime.
//! Every other component resolves evidence through `retrieve` and never
//! touches index or cache state directly.

use crate::cache::{FallbackCache, normalize_query};
use crate::config::RetrievalConfig;
use crate::corpus::{Corpus, CorpusDocument};
use crate::embeddings::Embedder;
use crate::fallback::{SearchProvider, Snippet};
use crate::index::VectorIndex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// The primary query surface for the verification pipeline.
pub struct RetrievalEngine {
    corpus: Corpus,
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
    fallback: Option<Box<dyn SearchProvider>>,
    cache: FallbackCache,
    /// Serializes the fallback read-check-then-write sequence so two
    /// concurrent misses for the same query cannot race the cache.
    fallback_gate: Mutex<()>,
    fallback_max_results: usize,
    fallback_timeout: Duration,
}

impl RetrievalEngine {
    /// Build the engine, encoding the full corpus once.
    ///
    /// The corpus is validated (non-empty, non-blank) before it reaches
    /// here; an empty corpus never constructs.
    pub fn new(
        corpus: Corpus,
        embedder: Arc<dyn Embedder>,
        config: &RetrievalConfig,
        fallback: Option<Box<dyn SearchProvider>>,
        cache: FallbackCache,
    ) -> Self {
        let index = VectorIndex::build(&corpus, embedder.as_ref());
        debug_assert_eq!(index.len(), corpus.len());
        Self {
            corpus,
            index,
            embedder,
            fallback,
            cache,
            fallback_gate: Mutex::new(()),
            fallback_max_results: config.fallback_max_results,
            fallback_timeout: Duration::from_secs(config.fallback_timeout_secs),
        }
    }

    pub fn corpus_size(&self) -> usize {
        self.corpus.len()
    }

    pub fn index_size(&self) -> usize {
        self.index.len()
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Resolve a query to an ordered evidence set.
    ///
    /// In-corpus results come back in descending similarity order with `k`
    /// clipped to the corpus size. When the in-corpus result is degenerate
    /// (empty, or nothing but blank text) and a fallback source is
    /// configured, the external snippets replace it entirely — never a
    /// merge.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Vec<CorpusDocument> {
        let query_vec = self.embedder.encode(query);
        let hits = self.index.search(&query_vec, top_k);
        let documents: Vec<CorpusDocument> = hits
            .iter()
            .filter_map(|hit| self.corpus.get(hit.position).cloned())
            .collect();

        let degenerate = documents.is_empty() || documents.iter().all(|d| d.text.trim().is_empty());
        if !degenerate {
            return documents;
        }

        if self.fallback.is_none() {
            debug!(query, "degenerate in-corpus result and no fallback source");
            return documents;
        }

        self.fallback_retrieve(query)
            .await
            .into_iter()
            .map(|s| CorpusDocument { id: s.id, text: s.text })
            .collect()
    }

    /// Cache-then-external fallback lookup.
    ///
    /// Holding the gate across the whole check-fetch-write keeps the
    /// sequence serialized; an empty cached list is an intentional hit
    /// (negative cache). The fetched list — even an empty one after a
    /// failure — is written back and persisted before returning, so a later
    /// crash cannot force a repeat of the external call.
    async fn fallback_retrieve(&self, query: &str) -> Vec<Snippet> {
        let provider = match &self.fallback {
            Some(p) => p,
            None => return Vec::new(),
        };

        let _gate = self.fallback_gate.lock().await;
        let normalized = normalize_query(query);

        if let Some(cached) = self.cache.get(&normalized).await {
            debug!(query = %normalized, hits = cached.len(), "fallback cache hit");
            return cached;
        }

        let fetched = match tokio::time::timeout(
            self.fallback_timeout,
            provider.search(query, self.fallback_max_results),
        )
        .await
        {
            Ok(Ok(snippets)) => snippets,
            Ok(Err(e)) => {
                warn!(query = %normalized, error = %e, "fallback search failed, degrading to empty");
                Vec::new()
            }
            Err(_) => {
                warn!(query = %normalized, timeout_secs = self.fallback_timeout.as_secs(), "fallback search timed out");
                Vec::new()
            }
        };

        self.cache.insert(normalized, fetched.clone()).await;
        fetched
    }
}

impl std::fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("corpus_size", &self.corpus.len())
            .field("index_size", &self.index.len())
            .field("fallback", &self.fallback.as_ref().map(|p| p.provider_name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashEmbedder;
    use crate::fallback::FallbackError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        snippets: Vec<Snippet>,
        fail: bool,
    }

    #[async_trait]
    impl SearchProvider for CountingProvider {
        async fn search(
            &self,
            _query: &str,
            _max_results: usize,
        ) -> Result<Vec<Snippet>, FallbackError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(FallbackError::Request("simulated outage".into()))
            } else {
                Ok(self.snippets.clone())
            }
        }

        fn provider_name(&self) -> &str {
            "counting"
        }
    }

    fn real_corpus() -> Corpus {
        Corpus::from_documents(vec![
            CorpusDocument {
                id: "spacex".into(),
                text: "SpaceX was founded by Elon Musk in 2002.".into(),
            },
            CorpusDocument {
                id: "eiffel".into(),
                text: "The Eiffel Tower is located in Paris, France.".into(),
            },
        ])
        .unwrap()
    }

    // A corpus whose every document is blank produces a degenerate result
    // set, which is the trigger for the fallback path.
    fn blank_corpus() -> Corpus {
        Corpus::from_documents(vec![
            CorpusDocument { id: "a".into(), text: "   ".into() },
            CorpusDocument { id: "b".into(), text: " ".into() },
        ])
        .unwrap()
    }

    fn engine(
        corpus: Corpus,
        fallback: Option<Box<dyn SearchProvider>>,
        dir: &TempDir,
    ) -> RetrievalEngine {
        RetrievalEngine::new(
            corpus,
            Arc::new(HashEmbedder::new(256)),
            &RetrievalConfig::default(),
            fallback,
            FallbackCache::open_in(dir.path()),
        )
    }

    #[tokio::test]
    async fn test_retrieve_in_corpus_order_and_clip() {
        let dir = TempDir::new().unwrap();
        let engine = engine(real_corpus(), None, &dir);

        let evidence = engine.retrieve("Who founded SpaceX?", 10).await;
        assert_eq!(evidence.len(), 2, "k clipped to corpus size");
        assert_eq!(evidence[0].id, "spacex", "most similar document first");
    }

    #[tokio::test]
    async fn test_index_matches_corpus() {
        let dir = TempDir::new().unwrap();
        let engine = engine(real_corpus(), None, &dir);
        assert_eq!(engine.index_size(), engine.corpus_size());
    }

    #[tokio::test]
    async fn test_fallback_substitutes_degenerate_results() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            calls: calls.clone(),
            snippets: vec![Snippet {
                id: "wikipedia:SpaceX".into(),
                text: "SpaceX was founded by Elon Musk.".into(),
            }],
            fail: false,
        };
        let engine = engine(blank_corpus(), Some(Box::new(provider)), &dir);

        let evidence = engine.retrieve("Who founded SpaceX?", 3).await;
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].id, "wikipedia:SpaceX");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_idempotence_single_external_call() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            calls: calls.clone(),
            snippets: vec![Snippet { id: "wikipedia:A".into(), text: "snippet".into() }],
            fail: false,
        };
        let engine = engine(blank_corpus(), Some(Box::new(provider)), &dir);

        let first = engine.retrieve("Same Query", 3).await;
        let second = engine.retrieve("  same query ", 3).await;
        assert_eq!(first, second, "normalized queries share the cache entry");
        assert_eq!(calls.load(Ordering::SeqCst), 1, "second call is a cache hit");
    }

    #[tokio::test]
    async fn test_fallback_failure_degrades_and_negative_caches() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            calls: calls.clone(),
            snippets: vec![],
            fail: true,
        };
        let engine = engine(blank_corpus(), Some(Box::new(provider)), &dir);

        let evidence = engine.retrieve("unknown thing", 3).await;
        assert!(evidence.is_empty(), "failure degrades to empty, never an error");

        // The empty result was cached: no second external call.
        let again = engine.retrieve("unknown thing", 3).await;
        assert!(again.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_fallback_for_healthy_corpus() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            calls: calls.clone(),
            snippets: vec![],
            fail: false,
        };
        let engine = engine(real_corpus(), Some(Box::new(provider)), &dir);

        let evidence = engine.retrieve("Eiffel Tower location", 2).await;
        assert!(!evidence.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0, "fallback is not a merge");
    }

    #[tokio::test]
    async fn test_degenerate_without_fallback_returns_as_is() {
        let dir = TempDir::new().unwrap();
        let engine = engine(blank_corpus(), None, &dir);
        let evidence = engine.retrieve("anything", 2).await;
        assert_eq!(evidence.len(), 2);
        assert!(evidence.iter().all(|d| d.text.trim().is_empty()));
    }

    #[tokio::test]
    async fn test_cache_persists_across_engines() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        {
            let provider = CountingProvider {
                calls: calls.clone(),
                snippets: vec![Snippet { id: "wikipedia:X".into(), text: "x".into() }],
                fail: false,
            };
            let engine = engine(blank_corpus(), Some(Box::new(provider)), &dir);
            engine.retrieve("persisted query", 3).await;
        }

        // A fresh engine over the same cache directory reuses the entry.
        let provider = CountingProvider {
            calls: calls.clone(),
            snippets: vec![],
            fail: false,
        };
        let engine = engine(blank_corpus(), Some(Box::new(provider)), &dir);
        let evidence = engine.retrieve("persisted query", 3).await;
        assert_eq!(evidence.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
