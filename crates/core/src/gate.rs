//! Cache gate for rendered output that embeds remote calendars.
//!
//! A rendered page may only be reused when every calendar it embeds has a
//! local cache entry. The entry files are then reported as freshness
//! dependencies so the host invalidates the page whenever one of them is
//! rewritten.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheStore, compute_cache_key};

/// Whether a rendered artifact may be reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateDecision {
    /// Every cache entry exists; merge these files into the dependency set.
    Cacheable(Vec<PathBuf>),
    /// At least one calendar has never been cached; render from scratch
    /// and do not store the result.
    NotCacheable,
}

impl GateDecision {
    pub fn is_cacheable(&self) -> bool {
        matches!(self, GateDecision::Cacheable(_))
    }

    /// Dependency paths, empty when not cacheable.
    pub fn dependencies(&self) -> &[PathBuf] {
        match self {
            GateDecision::Cacheable(paths) => paths,
            GateDecision::NotCacheable => &[],
        }
    }
}

/// Read-only view over a [`CacheStore`] answering reuse questions.
pub struct CacheGate<'a> {
    store: &'a dyn CacheStore,
}

impl<'a> CacheGate<'a> {
    pub fn new(store: &'a dyn CacheStore) -> Self {
        Self { store }
    }

    /// Decide whether output depending on `urls` can be reused.
    ///
    /// Fails closed: the first url without a cache entry short-circuits to
    /// [`GateDecision::NotCacheable`]. An empty list is always cacheable.
    /// Paths are returned in first-seen order, one per distinct cache key.
    pub fn evaluate<S: AsRef<str>>(&self, urls: &[S]) -> GateDecision {
        let mut seen = HashSet::new();
        let mut paths = Vec::with_capacity(urls.len());

        for url in urls {
            let url = url.as_ref();
            let key = compute_cache_key(url);
            if !seen.insert(key.clone()) {
                continue;
            }

            if !self.store.exists(&key) {
                tracing::debug!(url, "no cache entry, output not cacheable");
                return GateDecision::NotCacheable;
            }
            paths.push(self.store.locate(&key));
        }

        GateDecision::Cacheable(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FileStore;
    use tempfile::TempDir;

    async fn populated(urls: &[&str]) -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        for url in urls {
            store.write(&compute_cache_key(url), b"BEGIN:VCALENDAR").await.unwrap();
        }
        (dir, store)
    }

    #[tokio::test]
    async fn test_empty_list_is_cacheable() {
        let (_dir, store) = populated(&[]).await;
        let decision = CacheGate::new(&store).evaluate::<&str>(&[]);
        assert_eq!(decision, GateDecision::Cacheable(vec![]));
    }

    #[tokio::test]
    async fn test_all_present_returns_paths_in_order() {
        let (_dir, store) = populated(&["https://a.example/cal.ics", "https://b.example/cal.ics"]).await;

        let decision = CacheGate::new(&store).evaluate(&["https://b.example/cal.ics", "https://a.example/cal.ics"]);

        assert_eq!(
            decision,
            GateDecision::Cacheable(vec![
                store.locate(&compute_cache_key("https://b.example/cal.ics")),
                store.locate(&compute_cache_key("https://a.example/cal.ics")),
            ])
        );
    }

    #[tokio::test]
    async fn test_any_missing_is_not_cacheable() {
        let (_dir, store) = populated(&["https://a.example/cal.ics", "https://b.example/cal.ics"]).await;

        let decision = CacheGate::new(&store).evaluate(&[
            "https://a.example/cal.ics",
            "https://missing.example/cal.ics",
            "https://b.example/cal.ics",
        ]);

        assert_eq!(decision, GateDecision::NotCacheable);
        assert!(decision.dependencies().is_empty());
    }

    #[tokio::test]
    async fn test_only_missing_is_not_cacheable() {
        let (_dir, store) = populated(&[]).await;
        let decision = CacheGate::new(&store).evaluate(&["https://a.example/cal.ics"]);
        assert!(!decision.is_cacheable());
    }

    #[tokio::test]
    async fn test_shared_url_reported_once() {
        let (_dir, store) = populated(&["https://a.example/cal.ics", "https://b.example/cal.ics"]).await;

        let decision = CacheGate::new(&store).evaluate(&[
            "https://a.example/cal.ics",
            "https://b.example/cal.ics",
            "https://a.example/cal.ics",
        ]);

        assert_eq!(decision.dependencies().len(), 2);
        assert_eq!(decision.dependencies()[0], store.locate(&compute_cache_key("https://a.example/cal.ics")));
    }

    #[tokio::test]
    async fn test_evaluate_performs_no_writes() {
        let (dir, store) = populated(&["https://a.example/cal.ics"]).await;

        CacheGate::new(&store).evaluate(&["https://a.example/cal.ics", "https://missing.example/cal.ics"]);

        assert!(!store.exists(&compute_cache_key("https://missing.example/cal.ics")));
        let shards = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(shards, 1);
    }
}
