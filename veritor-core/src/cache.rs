//! Persistent cache for fallback search results.
//!
//! Maps a normalized query string (lowercased, trimmed) to the snippet list
//! a previous external lookup returned. Entries are reused verbatim for the
//! lifetime of the store — there is no TTL — and an empty list is a valid
//! entry, so repeated failed lookups never re-hit the external source.
//!
//! The store is rewritten wholesale on each update: serialize, write to a
//! `.tmp` sibling, rename. A crash mid-write leaves the previous file
//! intact.

use crate::fallback::Snippet;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Normalize a query for cache lookup: case-fold and trim.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Disk-backed `normalized query -> snippets` map.
pub struct FallbackCache {
    path: PathBuf,
    entries: Mutex<HashMap<String, Vec<Snippet>>>,
}

impl FallbackCache {
    /// Open the cache at `path`. A missing file is an empty cache; an
    /// unreadable or corrupt file degrades to an empty cache with a warning
    /// rather than failing startup.
    pub fn open(path: PathBuf) -> Self {
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "fallback cache unreadable, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "fallback cache read failed, starting empty");
                HashMap::new()
            }
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// An in-memory cache for tests and ephemeral runs; persists into the
    /// given directory like any other cache.
    pub fn open_in(dir: &Path) -> Self {
        Self::open(dir.join("fallback_cache.json"))
    }

    /// Look up a normalized query. `Some(vec![])` is a negative-cache hit
    /// and must short-circuit the external call exactly like a non-empty
    /// hit.
    pub async fn get(&self, normalized: &str) -> Option<Vec<Snippet>> {
        self.entries.lock().await.get(normalized).cloned()
    }

    /// Insert an entry and persist immediately.
    ///
    /// Persistence failures are logged but do not propagate: the in-memory
    /// entry still prevents repeat external calls for this process.
    pub async fn insert(&self, normalized: String, snippets: Vec<Snippet>) {
        let mut entries = self.entries.lock().await;
        entries.insert(normalized, snippets);
        if let Err(e) = persist(&self.path, &entries) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to persist fallback cache");
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

/// Atomic whole-file write: `.tmp` sibling then rename.
fn persist(path: &Path, entries: &HashMap<String, Vec<Snippet>>) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(entries).map_err(io::Error::other)?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json.as_bytes())?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn snippet(id: &str, text: &str) -> Snippet {
        Snippet {
            id: id.into(),
            text: text.into(),
        }
    }

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("  Who Founded SpaceX? "), "who founded spacex?");
        assert_eq!(normalize_query("already normal"), "already normal");
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_cache() {
        let dir = TempDir::new().unwrap();
        let cache = FallbackCache::open_in(dir.path());
        assert!(cache.is_empty().await);
        assert!(cache.get("anything").await.is_none());
    }

    #[tokio::test]
    async fn test_insert_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fallback_cache.json");

        let cache = FallbackCache::open(path.clone());
        cache
            .insert(
                "who founded spacex?".into(),
                vec![snippet("wikipedia:SpaceX", "SpaceX was founded by Elon Musk.")],
            )
            .await;
        assert!(path.exists());

        // A fresh open sees the persisted entry verbatim.
        let reopened = FallbackCache::open(path);
        let hit = reopened.get("who founded spacex?").await.unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].id, "wikipedia:SpaceX");
    }

    #[tokio::test]
    async fn test_empty_list_is_a_valid_entry() {
        let dir = TempDir::new().unwrap();
        let cache = FallbackCache::open_in(dir.path());
        cache.insert("no results query".into(), vec![]).await;

        // Negative cache: Some(empty), not None.
        let hit = cache.get("no results query").await;
        assert_eq!(hit, Some(vec![]));
    }

    #[tokio::test]
    async fn test_corrupt_file_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fallback_cache.json");
        std::fs::write(&path, "{truncated").unwrap();

        let cache = FallbackCache::open(path);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_rewrites_wholesale() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fallback_cache.json");

        let cache = FallbackCache::open(path.clone());
        cache.insert("first".into(), vec![snippet("wikipedia:A", "a")]).await;
        cache.insert("second".into(), vec![snippet("wikipedia:B", "b")]).await;

        let reopened = FallbackCache::open(path);
        assert_eq!(reopened.len().await, 2);
        assert!(reopened.get("first").await.is_some());
        assert!(reopened.get("second").await.is_some());
    }

    #[tokio::test]
    async fn test_no_tmp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fallback_cache.json");
        let cache = FallbackCache::open(path.clone());
        cache.insert("q".into(), vec![]).await;
        assert!(!path.with_extension("tmp").exists());
    }
}
