//! Error types for the Veritor core library.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering corpus loading, embedding providers, configuration, and the
//! optional LLM capability. Per-request degradations (fallback failures,
//! empty evidence) are deliberately *not* represented here: they degrade to
//! neutral results instead of propagating.

use std::path::PathBuf;

/// Top-level error type for the Veritor core library.
///
/// Every variant is fatal at the point it occurs: corpus and embedder errors
/// abort startup, config errors abort loading, LLM errors abort a single
/// decomposition call (and are swallowed by the fallback strategy).
#[derive(Debug, thiserror::Error)]
pub enum VeritorError {
    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while loading the trusted corpus. All fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("Corpus file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Corpus parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Corpus is empty: {path}")]
    Empty { path: PathBuf },

    #[error("Corpus document {position} has empty text")]
    BlankDocument { position: usize },
}

/// Errors from embedding provider construction.
///
/// Per-call encode failures of remote providers degrade to zero vectors and
/// are logged, so they never appear here.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Unknown embedding provider: {provider}")]
    UnknownProvider { provider: String },

    #[error("Missing API key for provider {provider}: set {env_var}")]
    MissingApiKey { provider: String, env_var: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// Errors from the narrow LLM capability used for claim decomposition.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

/// A type alias for results using the top-level `VeritorError`.
pub type Result<T> = std::result::Result<T, VeritorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_corpus() {
        let err = VeritorError::Corpus(CorpusError::Empty {
            path: PathBuf::from("data/corpus.json"),
        });
        assert_eq!(err.to_string(), "Corpus error: Corpus is empty: data/corpus.json");
    }

    #[test]
    fn test_error_display_embedding() {
        let err = VeritorError::Embedding(EmbeddingError::MissingApiKey {
            provider: "openai".into(),
            env_var: "OPENAI_API_KEY".into(),
        });
        assert_eq!(
            err.to_string(),
            "Embedding error: Missing API key for provider openai: set OPENAI_API_KEY"
        );
    }

    #[test]
    fn test_error_display_llm() {
        let err = VeritorError::Llm(LlmError::ApiRequest {
            message: "connection refused".into(),
        });
        assert_eq!(err.to_string(), "LLM error: API request failed: connection refused");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: VeritorError = io_err.into();
        assert!(matches!(err, VeritorError::Io(_)));
    }

    #[test]
    fn test_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: VeritorError = serde_err.into();
        assert!(matches!(err, VeritorError::Serialization(_)));
    }

    #[test]
    fn test_corpus_error_blank_document() {
        let err = CorpusError::BlankDocument { position: 3 };
        assert_eq!(err.to_string(), "Corpus document 3 has empty text");
    }
}
