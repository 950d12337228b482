//! Pluggable embedding providers.
//!
//! Every component in the pipeline sees text through the `Embedder` trait:
//! encode(text) -> fixed-length vector, deterministic for identical input.
//! The default `HashEmbedder` needs no external model; remote providers
//! (OpenAI, Ollama) are available for real semantic embeddings.

use crate::config::EmbeddingConfig;
use crate::error::{EmbeddingError, Result};
use serde_json::json;
use std::collections::BTreeMap;

/// Trait for embedding providers.
pub trait Embedder: Send + Sync {
    /// Encode a single text into a fixed-length vector.
    fn encode(&self, text: &str) -> Vec<f32>;

    /// Encode a batch of texts.
    fn encode_batch(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| self.encode(t)).collect()
    }

    /// Dimensionality of the vectors this provider produces.
    fn dimensions(&self) -> usize;

    /// Provider name for health reporting.
    fn provider_name(&self) -> &str;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths or zero-norm inputs rather than NaN,
/// so degraded (zero-vector) embeddings score as "no similarity".
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// L2-normalize a vector in place. Zero vectors are left untouched.
pub fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Hashed bag-of-words embedder (always available, no external model).
///
/// Tokenizes on non-alphanumeric boundaries, then accumulates term
/// frequencies for unigrams and adjacent-word bigrams into hashed dimension
/// buckets. Bigrams give short factual statements ("founded spacex") a
/// little word-order sensitivity that pure unigrams lack. Output is
/// L2-normalized.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

/// FNV-1a, stable across platforms and releases.
fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in s.as_bytes() {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

impl Embedder for HashEmbedder {
    fn encode(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            return vector;
        }

        // BTreeMap keeps term iteration order stable, so bucket accumulation
        // is bit-identical for identical input across runs.
        let mut tf: BTreeMap<String, usize> = BTreeMap::new();
        for word in &words {
            *tf.entry((*word).to_string()).or_insert(0) += 1;
        }
        for pair in words.windows(2) {
            *tf.entry(format!("{} {}", pair[0], pair[1])).or_insert(0) += 1;
        }

        for (term, count) in &tf {
            let idx = (fnv1a(term) % self.dimensions as u64) as usize;
            vector[idx] += *count as f32;
        }

        normalize(&mut vector);
        vector
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "hash"
    }
}

/// OpenAI API embedder (text-embedding-3-small by default).
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dims: usize,
    base_url: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| "text-embedding-3-small".into());
        let dims = match model.as_str() {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        };
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            dims,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com".into()),
        }
    }

    async fn request_embedding(&self, text: &str) -> Option<Vec<f32>> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({ "model": self.model, "input": text });
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .ok()?;
        let parsed: serde_json::Value = resp.json().await.ok()?;
        let values = parsed["data"][0]["embedding"].as_array()?;
        Some(
            values
                .iter()
                .filter_map(|v| v.as_f64().map(|f| f as f32))
                .collect(),
        )
    }
}

impl Embedder for OpenAiEmbedder {
    fn encode(&self, text: &str) -> Vec<f32> {
        block_on_embedding(self.dims, async { self.request_embedding(text).await })
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

/// Ollama embedder (local Ollama API, nomic-embed-text by default).
pub struct OllamaEmbedder {
    client: reqwest::Client,
    model: String,
    dims: usize,
    base_url: String,
}

impl OllamaEmbedder {
    pub fn new(model: Option<String>, base_url: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| "nomic-embed-text".into());
        let dims = match model.as_str() {
            "mxbai-embed-large" => 1024,
            "all-minilm" => 384,
            _ => 768,
        };
        Self {
            client: reqwest::Client::new(),
            model,
            dims,
            base_url: base_url.unwrap_or_else(|| "http://localhost:11434".into()),
        }
    }

    async fn request_embedding(&self, text: &str) -> Option<Vec<f32>> {
        let url = format!("{}/api/embed", self.base_url);
        let body = json!({ "model": self.model, "input": text });
        let resp = self.client.post(&url).json(&body).send().await.ok()?;
        let parsed: serde_json::Value = resp.json().await.ok()?;
        let values = parsed["embeddings"][0].as_array()?;
        Some(
            values
                .iter()
                .filter_map(|v| v.as_f64().map(|f| f as f32))
                .collect(),
        )
    }
}

impl Embedder for OllamaEmbedder {
    fn encode(&self, text: &str) -> Vec<f32> {
        block_on_embedding(self.dims, async { self.request_embedding(text).await })
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }
}

/// Bridge a remote embedding future into the sync `Embedder` trait.
///
/// Runs the future on the current tokio runtime from a scoped thread so the
/// async worker isn't blocked. Failures degrade to a zero vector — cosine
/// against it is 0, which reads as "no similarity" downstream.
fn block_on_embedding<F>(dims: usize, fut: F) -> Vec<f32>
where
    F: std::future::Future<Output = Option<Vec<f32>>> + Send,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => std::thread::scope(|s| {
            s.spawn(|| handle.block_on(fut))
                .join()
                .ok()
                .flatten()
                .unwrap_or_else(|| {
                    tracing::warn!("remote embedding failed, returning zero vector");
                    vec![0.0; dims]
                })
        }),
        Err(_) => {
            tracing::warn!("no tokio runtime available for remote embedding");
            vec![0.0; dims]
        }
    }
}

/// Build an embedder from configuration.
///
/// Unlike a silent local fallback, a misconfigured remote provider is a
/// startup failure: the process must not accept requests with an embedding
/// capability it cannot actually use.
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.provider.as_str() {
        "hash" => {
            let dims = if config.dimensions > 0 { config.dimensions } else { 256 };
            Ok(Box::new(HashEmbedder::new(dims)))
        }
        "openai" => {
            let env_var = "OPENAI_API_KEY";
            let api_key = std::env::var(env_var).unwrap_or_default();
            if api_key.is_empty() {
                return Err(EmbeddingError::MissingApiKey {
                    provider: "openai".into(),
                    env_var: env_var.into(),
                }
                .into());
            }
            Ok(Box::new(OpenAiEmbedder::new(
                api_key,
                config.model.clone(),
                config.base_url.clone(),
            )))
        }
        "ollama" => Ok(Box::new(OllamaEmbedder::new(
            config.model.clone(),
            config.base_url.clone(),
        ))),
        other => Err(EmbeddingError::UnknownProvider {
            provider: other.into(),
        }
        .into()),
    }
}
