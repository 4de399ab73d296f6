//! Byte store for cached calendar documents.
//!
//! Entries are plain files so a host can track them as freshness
//! dependencies by modification time.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::Error;

/// File extension for cached calendar documents.
pub const CACHE_EXTENSION: &str = "ical";

/// Key/value byte store keyed by [`compute_cache_key`](super::hash::compute_cache_key).
///
/// `exists` and `locate` are synchronous so the cache gate can run on a
/// render path without an async runtime.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Whether an entry exists for `key`.
    fn exists(&self, key: &str) -> bool;

    /// Where the entry for `key` lives (or would live).
    fn locate(&self, key: &str) -> PathBuf;

    /// Read an entry. A missing entry is `Ok(None)`, not an error.
    async fn read(&self, key: &str) -> Result<Option<Bytes>, Error>;

    /// Create or replace an entry.
    async fn write(&self, key: &str, content: &[u8]) -> Result<(), Error>;
}

/// Filesystem store laid out as `<root>/<first key char>/<key>.ical`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. Directories are created lazily on write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl CacheStore for FileStore {
    fn exists(&self, key: &str) -> bool {
        self.locate(key).is_file()
    }

    fn locate(&self, key: &str) -> PathBuf {
        let shard = key.get(..1).unwrap_or("_");
        self.root.join(shard).join(format!("{key}.{CACHE_EXTENSION}"))
    }

    async fn read(&self, key: &str) -> Result<Option<Bytes>, Error> {
        match tokio::fs::read(self.locate(key)).await {
            Ok(content) => Ok(Some(Bytes::from(content))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to a temporary sibling first and renames it into place, so
    /// readers see either the old or the new document.
    async fn write(&self, key: &str, content: &[u8]) -> Result<(), Error> {
        let path = self.locate(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension(format!("{CACHE_EXTENSION}.tmp"));
        tokio::fs::write(&tmp, content).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::debug!(key, bytes = content.len(), path = %path.display(), "wrote cache entry");
        Ok(())
    }
}

/// Read the cached document for a url without touching the network.
pub async fn read_cached(store: &dyn CacheStore, url: &str) -> Result<Option<Bytes>, Error> {
    store.read(&super::hash::compute_cache_key(url)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::hash::compute_cache_key;
    use tempfile::TempDir;

    #[test]
    fn test_locate_layout() {
        let store = FileStore::new("/var/cache/ical");
        let path = store.locate("abcdef");
        assert_eq!(path, PathBuf::from("/var/cache/ical/a/abcdef.ical"));
    }

    #[tokio::test]
    async fn test_read_missing() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert!(!store.exists("abc"));
        assert!(store.read("abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        store.write("abc", b"BEGIN:VCALENDAR\r\n").await.unwrap();

        assert!(store.exists("abc"));
        assert_eq!(store.read("abc").await.unwrap().unwrap(), Bytes::from_static(b"BEGIN:VCALENDAR\r\n"));
        assert!(store.locate("abc").starts_with(dir.path()));
    }

    #[tokio::test]
    async fn test_overwrite_in_place() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        store.write("abc", b"old").await.unwrap();
        store.write("abc", b"new").await.unwrap();

        assert_eq!(store.read("abc").await.unwrap().unwrap(), Bytes::from_static(b"new"));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("a")).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[tokio::test]
    async fn test_read_cached_by_url() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let url = "https://example.com/cal.ics";

        assert!(read_cached(&store, url).await.unwrap().is_none());

        store.write(&compute_cache_key(url), b"EVENT:foo").await.unwrap();
        assert_eq!(read_cached(&store, url).await.unwrap().unwrap(), Bytes::from_static(b"EVENT:foo"));
    }
}
