//! Counter-evidence generation: per-claim support vs. contradiction.
//!
//! Decomposes an answer into atomic claims, re-queries the retrieval engine
//! for each claim, and probes whether the evidence sits closer to the claim
//! or to its negation. The negated probe is embedding arithmetic, not an
//! entailment model; the margin exists because raw similarity is noisy and
//! a small contradiction edge is not proof of contradiction.

use crate::config::CounterConfig;
use crate::decompose::ClaimDecomposer;
use crate::embeddings::{Embedder, cosine_similarity};
use crate::retrieval::RetrievalEngine;
use crate::types::{ClaimAnalysis, ClaimStatus, CounterEvidenceReport};
use std::sync::Arc;
use tracing::debug;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Generates a per-claim counter-evidence breakdown.
pub struct CounterEvidenceGenerator {
    embedder: Arc<dyn Embedder>,
    decomposer: Arc<dyn ClaimDecomposer>,
    config: CounterConfig,
}

impl CounterEvidenceGenerator {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        decomposer: Arc<dyn ClaimDecomposer>,
        config: CounterConfig,
    ) -> Self {
        Self {
            embedder,
            decomposer,
            config,
        }
    }

    pub async fn generate(
        &self,
        question: &str,
        answer: &str,
        retrieval: &RetrievalEngine,
    ) -> CounterEvidenceReport {
        let claims = self.decomposer.decompose(answer, self.config.max_claims).await;
        debug!(strategy = self.decomposer.strategy_name(), count = claims.len(), "decomposed claims");

        let mut analysis = Vec::with_capacity(claims.len());
        for claim in claims {
            analysis.push(self.analyze_claim(&claim, retrieval).await);
        }

        CounterEvidenceReport {
            question: question.to_string(),
            answer: answer.to_string(),
            analysis,
        }
    }

    async fn analyze_claim(&self, claim: &str, retrieval: &RetrievalEngine) -> ClaimAnalysis {
        let evidence = retrieval.retrieve(claim, self.config.top_k).await;
        if evidence.is_empty() {
            return ClaimAnalysis {
                claim: claim.to_string(),
                status: ClaimStatus::NoEvidence,
                support_score: 0.0,
                contradiction_score: 0.0,
                support_passage: None,
                counter_passage: None,
            };
        }

        let claim_vec = self.embedder.encode(claim);
        let probe = format!("{} {}", self.config.negation_prefix, claim);
        let probe_vec = self.embedder.encode(&probe);

        let mut support = f64::MIN;
        let mut contradiction = f64::MIN;
        let mut support_idx = 0;
        let mut counter_idx = 0;
        for (i, passage) in evidence.iter().enumerate() {
            let passage_vec = self.embedder.encode(&passage.text);
            let s = f64::from(cosine_similarity(&claim_vec, &passage_vec));
            let c = f64::from(cosine_similarity(&probe_vec, &passage_vec));
            if s > support {
                support = s;
                support_idx = i;
            }
            if c > contradiction {
                contradiction = c;
                counter_idx = i;
            }
        }

        // Classification order matters: the contradiction test runs before
        // the support floor so a strongly-negated claim is never reported
        // as merely unverifiable.
        let status = if contradiction > support + self.config.contradiction_margin {
            ClaimStatus::LikelyContradicted
        } else if support < self.config.support_floor {
            ClaimStatus::Unverifiable
        } else {
            ClaimStatus::SupportedOrNeutral
        };

        ClaimAnalysis {
            claim: claim.to_string(),
            status,
            support_score: round2(support * 100.0),
            contradiction_score: round2(contradiction * 100.0),
            support_passage: Some(evidence[support_idx].text.clone()),
            counter_passage: Some(evidence[counter_idx].text.clone()),
        }
    }
}
