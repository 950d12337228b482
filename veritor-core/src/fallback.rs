//! External search capability used when the trusted corpus has no relevant
//! match.
//!
//! The provider is treated as unreliable by contract: every call is bounded
//! by a timeout and any failure (network, malformed response) degrades to an
//! empty snippet list at the call site. Nothing in this module surfaces an
//! error to verification callers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One snippet fetched from the external source. The id is tagged with the
/// source so fallback evidence is distinguishable from corpus evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: String,
    pub text: String,
}

/// Errors internal to the fallback path. Callers convert these to the
/// degrade-to-empty policy; they never cross the retrieval boundary.
#[derive(Debug, thiserror::Error)]
pub enum FallbackError {
    #[error("search request failed: {0}")]
    Request(String),

    #[error("search response parse error: {0}")]
    Parse(String),
}

/// Trait for external search sources.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search for `query`, returning up to `max_results` snippets in the
    /// source's own relevance order.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Snippet>, FallbackError>;

    /// Provider name for snippet id tagging and logs.
    fn provider_name(&self) -> &str;
}

/// Wikipedia search via the public MediaWiki API.
///
/// Uses `list=search` with plain-text snippets; result order is Wikipedia's
/// relevance ranking and is passed through unmodified.
pub struct WikipediaSearch {
    client: reqwest::Client,
    base_url: String,
}

impl WikipediaSearch {
    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url("https://en.wikipedia.org/w/api.php".into(), timeout)
    }

    pub fn with_base_url(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Veritor/0.3")
            .build()
            .unwrap_or_default();
        Self { client, base_url }
    }

    /// MediaWiki snippets carry `<span class="searchmatch">` markup.
    fn strip_markup(snippet: &str) -> String {
        let re = regex::Regex::new(r"<[^>]+>").expect("valid tag regex");
        let cleaned = re.replace_all(snippet, "");
        cleaned.replace("&quot;", "\"").replace("&amp;", "&").trim().to_string()
    }
}

#[async_trait]
impl SearchProvider for WikipediaSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Snippet>, FallbackError> {
        let url = format!(
            "{}?action=query&list=search&srsearch={}&srlimit={}&format=json&utf8=1",
            self.base_url,
            urlencoding::encode(query),
            max_results.max(1)
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FallbackError::Request(e.to_string()))?;

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| FallbackError::Parse(e.to_string()))?;

        let results = body["query"]["search"]
            .as_array()
            .ok_or_else(|| FallbackError::Parse("missing query.search array".into()))?;

        let snippets = results
            .iter()
            .take(max_results)
            .filter_map(|entry| {
                let title = entry["title"].as_str()?;
                let raw = entry["snippet"].as_str()?;
                let text = Self::strip_markup(raw);
                if text.is_empty() {
                    return None;
                }
                Some(Snippet {
                    id: format!("wikipedia:{title}"),
                    text,
                })
            })
            .collect();

        Ok(snippets)
    }

    fn provider_name(&self) -> &str {
        "wikipedia"
    }
}
