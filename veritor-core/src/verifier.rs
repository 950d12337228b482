//! Verification orchestrator.
//!
//! Owns the process-wide engine state (index, cache, embedder) as an
//! explicitly constructed object handed to request-handling code, and runs
//! the retrieval -> scoring -> optional counter-evidence chain sequentially
//! per request.

use crate::cache::FallbackCache;
use crate::config::VeritorConfig;
use crate::corpus::Corpus;
use crate::counter::CounterEvidenceGenerator;
use crate::decompose::{ClaimDecomposer, LlmDecomposer, SentenceDecomposer};
use crate::embeddings::build_embedder;
use crate::error::{ConfigError, Result};
use crate::fallback::{SearchProvider, WikipediaSearch};
use crate::llm::OpenAiCompatProvider;
use crate::retrieval::RetrievalEngine;
use crate::scorer::ConfidenceScorer;
use crate::types::{Verdict, VerifyRequest, VerifyResponse};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// The complete verification pipeline, constructed once at startup.
pub struct Verifier {
    retrieval: RetrievalEngine,
    scorer: ConfidenceScorer,
    counter: CounterEvidenceGenerator,
    top_k: usize,
}

impl Verifier {
    /// Build the full pipeline from configuration. Any failure here —
    /// corpus missing or malformed, embedding provider unusable — is fatal:
    /// the process must not accept requests.
    pub fn from_config(config: &VeritorConfig) -> Result<Self> {
        validate_config(config)?;
        let embedder: Arc<dyn crate::embeddings::Embedder> =
            Arc::from(build_embedder(&config.embedding)?);
        let corpus = Corpus::load(&config.corpus_path)?;
        info!(
            corpus = %config.corpus_path.display(),
            documents = corpus.len(),
            embedder = embedder.provider_name(),
            "corpus loaded"
        );

        let fallback: Option<Box<dyn SearchProvider>> = if config.retrieval.fallback_enabled {
            Some(Box::new(WikipediaSearch::new(Duration::from_secs(
                config.retrieval.fallback_timeout_secs,
            ))))
        } else {
            None
        };
        let cache = FallbackCache::open(config.retrieval.cache_path.clone());

        // Decomposition strategy is selected by configuration/availability:
        // a configured LLM that cannot be constructed (no key) downgrades
        // to the deterministic splitter rather than failing startup, since
        // counter-evidence is an optional feature of a request.
        let decomposer: Arc<dyn ClaimDecomposer> = match &config.llm {
            Some(llm_config) => match OpenAiCompatProvider::from_config(llm_config) {
                Ok(provider) => Arc::new(LlmDecomposer::new(Arc::new(provider))),
                Err(e) => {
                    warn!(error = %e, "LLM decomposition unavailable, using sentence splitter");
                    Arc::new(SentenceDecomposer::new())
                }
            },
            None => Arc::new(SentenceDecomposer::new()),
        };

        let retrieval =
            RetrievalEngine::new(corpus, embedder.clone(), &config.retrieval, fallback, cache);
        let scorer = ConfidenceScorer::new(embedder.clone(), config.scoring.clone());
        let counter = CounterEvidenceGenerator::new(embedder, decomposer, config.counter.clone());

        Ok(Self {
            retrieval,
            scorer,
            counter,
            top_k: config.retrieval.top_k,
        })
    }

    /// Assemble a verifier from pre-built parts. Lets tests inject fake
    /// embedders, providers, and caches without touching configuration.
    pub fn from_parts(
        retrieval: RetrievalEngine,
        scorer: ConfidenceScorer,
        counter: CounterEvidenceGenerator,
        top_k: usize,
    ) -> Self {
        Self {
            retrieval,
            scorer,
            counter,
            top_k,
        }
    }

    pub fn corpus_size(&self) -> usize {
        self.retrieval.corpus_size()
    }

    pub fn embedder_name(&self) -> &str {
        self.retrieval.embedder().provider_name()
    }

    /// Run one verification request through the pipeline.
    ///
    /// The scorer's advisory verdict is replaced by the caller-threshold
    /// verdict computed over the same confidence percentage; both use the
    /// identical three-band ordering.
    pub async fn verify(&self, request: &VerifyRequest) -> VerifyResponse {
        let evidence = self.retrieval.retrieve(&request.question, self.top_k).await;
        let mut report = self.scorer.evaluate(&request.answer, &evidence);
        report.verdict = Verdict::grade(
            report.confidence,
            request.threshold_green,
            request.threshold_yellow,
        );

        let counter_evidence = if request.include_counter {
            Some(
                self.counter
                    .generate(&request.question, &request.answer, &self.retrieval)
                    .await,
            )
        } else {
            None
        };

        VerifyResponse {
            report,
            counter_evidence,
        }
    }
}

/// Reject configurations that would misbehave silently at request time.
fn validate_config(config: &VeritorConfig) -> Result<()> {
    if config.scoring.weak_band > config.scoring.strong_band {
        return Err(ConfigError::Invalid {
            message: format!(
                "scoring.weak_band ({}) exceeds scoring.strong_band ({})",
                config.scoring.weak_band, config.scoring.strong_band
            ),
        }
        .into());
    }
    if !(0.0..=1.0).contains(&config.counter.support_floor) {
        return Err(ConfigError::Invalid {
            message: format!(
                "counter.support_floor ({}) must be a fraction in [0, 1]",
                config.counter.support_floor
            ),
        }
        .into());
    }
    if config.counter.contradiction_margin < 0.0 {
        return Err(ConfigError::Invalid {
            message: format!(
                "counter.contradiction_margin ({}) must be non-negative",
                config.counter.contradiction_margin
            ),
        }
        .into());
    }
    Ok(())
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("corpus_size", &self.corpus_size())
            .field("top_k", &self.top_k)
            .finish()
    }
}
