//! Shared handles the tools operate on.

use std::sync::Arc;

use icalcache_client::{FetchClient, FetchConfig};
use icalcache_core::{AppConfig, CacheDb, Error, Fetch, FileStore, RefreshWorker};

#[derive(Clone)]
pub struct AppState {
    pub db: CacheDb,
    pub store: Arc<FileStore>,
    pub worker: Arc<RefreshWorker>,
}

impl AppState {
    pub fn new(db: CacheDb, store: FileStore, fetcher: Arc<dyn Fetch>, stale_after: chrono::Duration) -> Self {
        let store = Arc::new(store);
        let worker = Arc::new(RefreshWorker::new(db.clone(), store.clone(), fetcher, stale_after));
        Self { db, store, worker }
    }

    /// Open the metadata database and cache directory named by `config`.
    pub async fn open(config: &AppConfig) -> Result<Self, Error> {
        let db = CacheDb::open(&config.db_path).await?;
        let store = FileStore::new(&config.cache_dir);
        let fetcher = Arc::new(FetchClient::new(FetchConfig::from(config))?);

        tracing::info!(
            cache_dir = %config.cache_dir.display(),
            db_path = %config.db_path.display(),
            stale_after_secs = config.stale_after_secs,
            "cache opened"
        );

        Ok(Self::new(db, store, fetcher, config.stale_after()))
    }
}
