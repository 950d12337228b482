//! Claim decomposition strategies.
//!
//! Splitting an answer into atomic claims is a pluggable capability with
//! two tiers: a language-model strategy when one is configured, and a
//! deterministic sentence splitter that is always available and serves as
//! the fallback for every LLM failure mode. The counter-evidence generator
//! is agnostic to which strategy produced the claims.

use crate::llm::LlmProvider;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Capability interface: answer text to a list of short factual claims.
#[async_trait]
pub trait ClaimDecomposer: Send + Sync {
    async fn decompose(&self, answer: &str, max_claims: usize) -> Vec<String>;

    fn strategy_name(&self) -> &str;
}

/// Deterministic splitter: sentence fragments of plausible claim length.
///
/// Splits on sentence-ending periods and keeps fragments whose word count
/// is strictly between 4 and 30. When nothing qualifies the whole answer is
/// treated as a single claim, so decomposition always yields at least one.
#[derive(Debug, Clone, Default)]
pub struct SentenceDecomposer;

impl SentenceDecomposer {
    pub fn new() -> Self {
        Self
    }

    fn split(answer: &str, max_claims: usize) -> Vec<String> {
        let fragments: Vec<String> = answer
            .split('.')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .filter(|p| {
                let words = p.split_whitespace().count();
                words > 4 && words < 30
            })
            .take(max_claims)
            .map(String::from)
            .collect();

        if fragments.is_empty() {
            vec![answer.trim().to_string()]
        } else {
            fragments
        }
    }
}

#[async_trait]
impl ClaimDecomposer for SentenceDecomposer {
    async fn decompose(&self, answer: &str, max_claims: usize) -> Vec<String> {
        Self::split(answer, max_claims)
    }

    fn strategy_name(&self) -> &str {
        "sentence"
    }
}

/// LLM-backed decomposition with deterministic fallback.
///
/// Any failure — call error, unparseable output, an empty claim list —
/// falls through to `SentenceDecomposer` rather than surfacing.
pub struct LlmDecomposer {
    provider: Arc<dyn LlmProvider>,
}

impl LlmDecomposer {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    fn prompt(answer: &str, max_claims: usize) -> String {
        format!(
            "You are a precise information analyst. Break the following answer into \
             up to {max_claims} short, factual, atomically-verifiable claims (no opinions). \
             Return them as a JSON array of strings ONLY.\n\nAnswer:\n{answer}"
        )
    }

    /// Parse the model output as a JSON array of non-empty strings.
    fn parse_claims(raw: &str, max_claims: usize) -> Option<Vec<String>> {
        let claims: Vec<serde_json::Value> = serde_json::from_str(raw.trim()).ok()?;
        let claims: Vec<String> = claims
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
            .take(max_claims)
            .collect();
        if claims.is_empty() { None } else { Some(claims) }
    }
}

#[async_trait]
impl ClaimDecomposer for LlmDecomposer {
    async fn decompose(&self, answer: &str, max_claims: usize) -> Vec<String> {
        match self.provider.complete(&Self::prompt(answer, max_claims)).await {
            Ok(raw) => match Self::parse_claims(&raw, max_claims) {
                Some(claims) => {
                    debug!(model = self.provider.model_name(), count = claims.len(), "LLM decomposition");
                    claims
                }
                None => {
                    warn!(model = self.provider.model_name(), "unparseable decomposition output, using sentence splitter");
                    SentenceDecomposer::split(answer, max_claims)
                }
            },
            Err(e) => {
                warn!(model = self.provider.model_name(), error = %e, "LLM decomposition failed, using sentence splitter");
                SentenceDecomposer::split(answer, max_claims)
            }
        }
    }

    fn strategy_name(&self) -> &str {
        "llm"
    }
}
