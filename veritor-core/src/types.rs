//! Shared types for the verification pipeline.
//!
//! Defines the request/response contract, the graded verdict, and the
//! per-claim counter-evidence types. All response types are produced fresh
//! per request and never persisted.

use serde::{Deserialize, Serialize};

/// Inbound verification request from the boundary layer.
///
/// Thresholds are fractions in [0, 1] and are compared against the
/// confidence percentage after scaling (see [`Verdict::grade`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub question: String,
    pub answer: String,
    /// Whether to run the counter-evidence generator.
    #[serde(default)]
    pub include_counter: bool,
    /// Confidence at or above this fraction is Verified.
    #[serde(default = "default_threshold_green")]
    pub threshold_green: f64,
    /// Confidence at or above this fraction (but below green) is suspect.
    #[serde(default = "default_threshold_yellow")]
    pub threshold_yellow: f64,
}

fn default_threshold_green() -> f64 {
    0.70
}

fn default_threshold_yellow() -> f64 {
    0.40
}

/// Final tri-state classification of an answer against its evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Verified,
    #[serde(rename = "Hallucination Suspected")]
    HallucinationSuspected,
    Unverifiable,
}

impl Verdict {
    /// Map a confidence percentage (0-100) onto the three verdict bands.
    ///
    /// `green` and `yellow` are caller-supplied fractions in [0, 1], scaled
    /// by 100 for comparison. The scorer's advisory verdict and the boundary
    /// layer's final verdict both go through this exact banding.
    pub fn grade(confidence_pct: f64, green: f64, yellow: f64) -> Self {
        if confidence_pct >= green * 100.0 {
            Verdict::Verified
        } else if confidence_pct >= yellow * 100.0 {
            Verdict::HallucinationSuspected
        } else {
            Verdict::Unverifiable
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Verified => write!(f, "Verified"),
            Verdict::HallucinationSuspected => write!(f, "Hallucination Suspected"),
            Verdict::Unverifiable => write!(f, "Unverifiable"),
        }
    }
}

/// A single evidence passage returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidencePassage {
    pub id: String,
    pub text: String,
}

/// Output of the confidence scorer for one (answer, evidence) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Advisory verdict from the scorer's own fixed bands; the boundary
    /// layer overwrites this with the caller-threshold verdict.
    pub verdict: Verdict,
    /// Mean answer/evidence cosine similarity as a percentage, 2 decimals.
    pub confidence: f64,
    pub rationale: String,
    pub evidence: Vec<EvidencePassage>,
    /// Percentage of informative answer terms found in the evidence text.
    pub coverage: f64,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
}

/// Classification of one atomic claim against its retrieved evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Evidence aligns with the claim, or at least does not oppose it.
    SupportedOrNeutral,
    /// Evidence sits closer to the claim's negation than to the claim.
    LikelyContradicted,
    /// Evidence exists but is too weak to support the claim.
    Unverifiable,
    /// No passages could be retrieved for the claim at all.
    NoEvidence,
}

/// Per-claim analysis from the counter-evidence generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimAnalysis {
    pub claim: String,
    pub status: ClaimStatus,
    /// Max cosine(claim, passage) over retrieved passages, as a percentage.
    pub support_score: f64,
    /// Max cosine(negated probe, passage) over passages, as a percentage.
    pub contradiction_score: f64,
    /// The passage achieving the max support similarity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_passage: Option<String>,
    /// The passage achieving the max contradiction similarity. May be the
    /// same passage as `support_passage`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_passage: Option<String>,
}

/// Full counter-evidence breakdown for one verification request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterEvidenceReport {
    pub question: String,
    pub answer: String,
    pub analysis: Vec<ClaimAnalysis>,
}

/// Complete response for one verification request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyResponse {
    #[serde(flatten)]
    pub report: VerificationReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_evidence: Option<CounterEvidenceReport>,
}
