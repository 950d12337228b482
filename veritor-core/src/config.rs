//! Configuration system for Veritor.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config -> environment -> explicit overrides. Configuration is
//! loaded from `~/.config/veritor/config.toml` and/or `.veritor/config.toml`
//! in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the verification service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VeritorConfig {
    /// Path to the trusted corpus file (JSON array of `{id?, text}`).
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub counter: CounterConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Optional LLM used for claim decomposition. When absent, the
    /// deterministic sentence splitter is the only strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmConfig>,
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/corpus.json")
}

impl Default for VeritorConfig {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            scoring: ScoringConfig::default(),
            counter: CounterConfig::default(),
            server: ServerConfig::default(),
            llm: None,
        }
    }
}

/// Configuration for embedding providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider name: "hash" (default), "openai", "ollama".
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    /// Provider-specific model name.
    #[serde(default)]
    pub model: Option<String>,
    /// Embedding dimensions (0 = provider default).
    #[serde(default)]
    pub dimensions: usize,
    /// Optional base URL override for remote providers.
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_embedding_provider() -> String {
    "hash".into()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "hash".into(),
            model: None,
            dimensions: 0,
            base_url: None,
        }
    }
}

/// Configuration for the retrieval engine and its fallback source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Evidence passages returned per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Whether to consult the external search source when the corpus has
    /// nothing relevant.
    #[serde(default = "default_true")]
    pub fallback_enabled: bool,
    /// Max snippets requested from the external source.
    #[serde(default = "default_fallback_max_results")]
    pub fallback_max_results: usize,
    /// Hard bound on each external call.
    #[serde(default = "default_fallback_timeout_secs")]
    pub fallback_timeout_secs: u64,
    /// Where the fallback cache is persisted.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
}

fn default_top_k() -> usize {
    3
}
fn default_true() -> bool {
    true
}
fn default_fallback_max_results() -> usize {
    3
}
fn default_fallback_timeout_secs() -> u64 {
    5
}
fn default_cache_path() -> PathBuf {
    PathBuf::from(".veritor/fallback_cache.json")
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            fallback_enabled: true,
            fallback_max_results: 3,
            fallback_timeout_secs: 5,
            cache_path: default_cache_path(),
        }
    }
}

/// Configuration for the confidence scorer's advisory verdict bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Mean similarity at or above this fraction reads as strong alignment.
    #[serde(default = "default_strong_band")]
    pub strong_band: f64,
    /// Mean similarity at or above this fraction (below strong) is partial.
    #[serde(default = "default_weak_band")]
    pub weak_band: f64,
}

fn default_strong_band() -> f64 {
    0.70
}
fn default_weak_band() -> f64 {
    0.40
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            strong_band: 0.70,
            weak_band: 0.40,
        }
    }
}

/// Configuration for the counter-evidence generator.
///
/// The margin and floor are tunable policy constants, not calibrated values;
/// they live here rather than in code so deployments can adjust them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterConfig {
    #[serde(default = "default_max_claims")]
    pub max_claims: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// How far the contradiction signal must exceed the support signal
    /// before a claim is classified as contradicted.
    #[serde(default = "default_contradiction_margin")]
    pub contradiction_margin: f64,
    /// Support similarity below this fraction reads as unverifiable.
    #[serde(default = "default_support_floor")]
    pub support_floor: f64,
    /// Falsity marker prepended to a claim to form the negated probe.
    #[serde(default = "default_negation_prefix")]
    pub negation_prefix: String,
}

fn default_max_claims() -> usize {
    3
}
fn default_contradiction_margin() -> f64 {
    0.15
}
fn default_support_floor() -> f64 {
    0.35
}
fn default_negation_prefix() -> String {
    "It is false that".into()
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            max_claims: 3,
            top_k: 3,
            contradiction_margin: 0.15,
            support_floor: 0.35,
            negation_prefix: default_negation_prefix(),
        }
    }
}

/// HTTP service bind configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8900
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8900,
        }
    }
}

/// Configuration for the narrow claim-decomposition LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier (e.g., "gpt-4o-mini").
    pub model: String,
    /// Environment variable name containing the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Optional base URL override for the chat-completions endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Sampling temperature for decomposition.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Hard bound on each decomposition call.
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_llm_timeout_secs() -> u64 {
    20
}

/// Load layered configuration.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `VERITOR_`)
/// 3. Workspace-local config (`.veritor/config.toml`)
/// 4. User config (`~/.config/veritor/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&VeritorConfig>,
) -> Result<VeritorConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(VeritorConfig::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("dev", "veritor", "veritor") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".veritor").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // Environment variables (VERITOR_RETRIEVAL__TOP_K, VERITOR_SERVER__PORT, ...)
    figment = figment.merge(Env::prefixed("VERITOR_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}
