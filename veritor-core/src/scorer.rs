//! Confidence scorer: answer-vs-evidence similarity plus keyword coverage.
//!
//! Confidence is the mean cosine similarity between the answer and every
//! evidence passage. The mean rather than the max rewards broad, consistent
//! support across passages and penalizes a single lucky match. Coverage is
//! a lexical explainability signal layered on top.

use crate::config::ScoringConfig;
use crate::corpus::CorpusDocument;
use crate::embeddings::{Embedder, cosine_similarity};
use crate::types::{EvidencePassage, Verdict, VerificationReport};
use regex::Regex;
use std::sync::Arc;
use std::sync::LazyLock;

/// Kept local: a small stop-word list is all coverage extraction needs.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "shall", "should", "may", "might", "must", "can",
    "could", "of", "in", "on", "at", "to", "for", "and", "or", "if", "then", "else", "with",
    "by", "as", "from", "that", "this", "these", "those", "it", "its", "into", "over", "under",
    "not", "no", "but", "so", "you", "your", "we", "our", "they", "their", "them", "he", "she",
    "his", "her", "who", "whom", "which", "what", "when", "where", "why", "how",
];

/// Alphanumeric words, hyphens preserved, leading letter required.
static KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z][a-z0-9-]+").expect("valid keyword regex"));

const MATCHED_CAP: usize = 20;
const MISSING_CAP: usize = 10;

/// Extract informative tokens from an answer: lowercase, length > 2,
/// stop-words removed, de-duplicated preserving first occurrence so the
/// report is deterministic for identical input.
pub fn keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut seen = std::collections::HashSet::new();
    KEYWORD_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .filter(|t| t.len() > 2 && !STOP_WORDS.contains(&t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scores an answer against an evidence set.
pub struct ConfidenceScorer {
    embedder: Arc<dyn Embedder>,
    config: ScoringConfig,
}

impl ConfidenceScorer {
    pub fn new(embedder: Arc<dyn Embedder>, config: ScoringConfig) -> Self {
        Self { embedder, config }
    }

    /// Evaluate an answer against its evidence.
    ///
    /// Empty evidence is a terminal case, not an error: the fixed degenerate
    /// report below is the defined result.
    pub fn evaluate(&self, answer: &str, evidence: &[CorpusDocument]) -> VerificationReport {
        if evidence.is_empty() {
            return VerificationReport {
                verdict: Verdict::Unverifiable,
                confidence: 0.0,
                rationale: "No supporting evidence retrieved.".into(),
                evidence: vec![],
                coverage: 0.0,
                matched_keywords: vec![],
                missing_keywords: vec![],
            };
        }

        let answer_vec = self.embedder.encode(answer);
        let mean_sim: f64 = evidence
            .iter()
            .map(|doc| f64::from(cosine_similarity(&answer_vec, &self.embedder.encode(&doc.text))))
            .sum::<f64>()
            / evidence.len() as f64;
        let mean_sim = mean_sim.clamp(-1.0, 1.0);
        let confidence = round2(mean_sim * 100.0);

        let answer_keys = keywords(answer);
        let evidence_concat = evidence
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let (matched, missing): (Vec<String>, Vec<String>) = answer_keys
            .iter()
            .cloned()
            .partition(|k| evidence_concat.contains(k.as_str()));

        // An answer with no informative tokens is fully covered by
        // definition, not a divide-by-zero edge.
        let coverage = if answer_keys.is_empty() {
            100.0
        } else {
            round2(matched.len() as f64 / answer_keys.len() as f64 * 100.0)
        };

        let rationale = self.rationale(mean_sim, coverage, &missing);
        let verdict = Verdict::grade(confidence, self.config.strong_band, self.config.weak_band);

        VerificationReport {
            verdict,
            confidence,
            rationale,
            evidence: evidence
                .iter()
                .map(|d| EvidencePassage {
                    id: d.id.clone(),
                    text: d.text.clone(),
                })
                .collect(),
            coverage,
            matched_keywords: matched.into_iter().take(MATCHED_CAP).collect(),
            missing_keywords: missing.into_iter().take(MISSING_CAP).collect(),
        }
    }

    /// Deterministic rationale over three similarity bands.
    fn rationale(&self, similarity: f64, coverage: f64, missing: &[String]) -> String {
        if similarity < self.config.weak_band {
            let cited = if missing.is_empty() {
                "none".to_string()
            } else {
                missing
                    .iter()
                    .take(5)
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            format!("Low semantic match and low coverage ({coverage}%). Missing key terms: {cited}.")
        } else if similarity < self.config.strong_band {
            format!(
                "Partial support: moderate similarity with coverage {coverage}%. Some terms are weakly supported."
            )
        } else {
            format!("Answer aligns well with retrieved evidence; coverage {coverage}%.")
        }
    }
}
