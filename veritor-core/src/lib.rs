//! # Veritor Core
//!
//! Core library for the Veritor verification service.
//! Provides the retrieval engine (corpus index, external fallback, cache),
//! the confidence scorer, the counter-evidence generator, and the HTTP
//! boundary that exposes verification as a callable operation.

pub mod cache;
pub mod config;
pub mod corpus;
pub mod counter;
pub mod decompose;
pub mod embeddings;
pub mod error;
pub mod fallback;
pub mod index;
pub mod llm;
pub mod retrieval;
pub mod scorer;
pub mod service;
pub mod types;
pub mod verifier;

// Re-export commonly used types at the crate root.
pub use cache::FallbackCache;
pub use config::{VeritorConfig, load_config};
pub use corpus::{Corpus, CorpusDocument};
pub use counter::CounterEvidenceGenerator;
pub use decompose::{ClaimDecomposer, LlmDecomposer, SentenceDecomposer};
pub use embeddings::{Embedder, HashEmbedder, build_embedder, cosine_similarity};
pub use error::{Result, VeritorError};
pub use fallback::{SearchProvider, Snippet, WikipediaSearch};
pub use llm::{LlmProvider, MockLlmProvider, OpenAiCompatProvider};
pub use retrieval::RetrievalEngine;
pub use scorer::ConfidenceScorer;
pub use service::{ServiceState, SharedService, router};
pub use types::{
    ClaimAnalysis, ClaimStatus, CounterEvidenceReport, EvidencePassage, Verdict,
    VerificationReport, VerifyRequest, VerifyResponse,
};
pub use verifier::Verifier;
