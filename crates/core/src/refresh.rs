//! Refresh worker: lazily converges cached calendars toward their remote
//! content, one calendar per pass.
//!
//! A pass picks the first tracked calendar whose last check is at least
//! `stale_after` old, fetches it, and rewrites the cache entry only when the
//! normalized fingerprint changed. The checked calendar then moves to the
//! back of the list with `last_checked_at = now`. Fetch failures leave the
//! list untouched so the next pass retries the same calendar.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::Instrument;

use crate::Error;
use crate::cache::{CacheDb, CacheStore, TrackedResource, compute_cache_key, normalized_fingerprint};
use crate::fetch::Fetch;

/// Result of a single refresh pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// No tracked calendar was due; nothing was fetched or changed.
    NoOp,
    /// The remote document changed and the cache entry was rewritten.
    Updated { url: String, resources: Vec<TrackedResource> },
    /// The remote document matched the cache apart from volatile lines.
    Unchanged { url: String, resources: Vec<TrackedResource> },
}

impl RefreshOutcome {
    /// The tracked list after this pass, if it checked a calendar.
    pub fn resources(&self) -> Option<&[TrackedResource]> {
        match self {
            RefreshOutcome::NoOp => None,
            RefreshOutcome::Updated { resources, .. } | RefreshOutcome::Unchanged { resources, .. } => {
                Some(resources.as_slice())
            }
        }
    }

    /// Replace the list carried by a pass that checked a calendar.
    pub fn with_resources(self, resources: Vec<TrackedResource>) -> Self {
        match self {
            RefreshOutcome::NoOp => RefreshOutcome::NoOp,
            RefreshOutcome::Updated { url, .. } => RefreshOutcome::Updated { url, resources },
            RefreshOutcome::Unchanged { url, .. } => RefreshOutcome::Unchanged { url, resources },
        }
    }

    /// The calendar checked by this pass.
    pub fn url(&self) -> Option<&str> {
        match self {
            RefreshOutcome::NoOp => None,
            RefreshOutcome::Updated { url, .. } | RefreshOutcome::Unchanged { url, .. } => Some(url.as_str()),
        }
    }
}

/// Run one refresh pass over an ordered list of tracked calendars.
///
/// At most one calendar is fetched. Both the cached and the fetched
/// document are normalized before their fingerprints are compared; the
/// cache keeps the fetched bytes verbatim. A missing cache entry counts as
/// empty content, so the first successful fetch always populates it.
///
/// # Errors
///
/// `Error::FetchFailed` when the selected calendar cannot be fetched, and
/// store errors when the cache entry cannot be read or written. No resource
/// is modified in either case.
pub async fn run_one_pass(
    resources: &[TrackedResource], stale_after: chrono::Duration, now: DateTime<Utc>, store: &dyn CacheStore,
    fetcher: &dyn Fetch,
) -> Result<RefreshOutcome, Error> {
    let Some(index) = resources.iter().position(|r| r.is_stale(stale_after, now)) else {
        return Ok(RefreshOutcome::NoOp);
    };
    let url = resources[index].url.clone();
    let key = compute_cache_key(&url);

    let cached = store.read(&key).await?.unwrap_or_default();
    let old_fingerprint = normalized_fingerprint(&cached);

    let fetched = match fetcher.get(&url).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "calendar refresh failed, will retry next pass");
            return Err(e);
        }
    };
    let new_fingerprint = normalized_fingerprint(&fetched);

    let changed = old_fingerprint != new_fingerprint;
    if changed {
        store.write(&key, &fetched).await?;
        tracing::info!(url = %url, bytes = fetched.len(), "calendar changed, cache updated");
    } else {
        tracing::debug!(url = %url, "calendar unchanged");
    }

    let mut updated = resources.to_vec();
    let mut checked = updated.remove(index);
    checked.last_checked_at = now;
    updated.push(checked);

    Ok(if changed {
        RefreshOutcome::Updated { url, resources: updated }
    } else {
        RefreshOutcome::Unchanged { url, resources: updated }
    })
}

/// Outcome of one document's pass within [`RefreshWorker::run_all`].
#[derive(Debug)]
pub struct DocumentPass {
    pub document: String,
    pub outcome: Result<RefreshOutcome, Error>,
}

/// Runs refresh passes against persisted tracked-resource lists.
///
/// Passes and list reconciliation through one worker are serialized, so the
/// fingerprint compare-and-write and the timestamp persist never interleave
/// with another change to the same list.
pub struct RefreshWorker {
    db: CacheDb,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetch>,
    stale_after: chrono::Duration,
    pass_lock: Mutex<()>,
}

impl RefreshWorker {
    pub fn new(
        db: CacheDb, store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetch>, stale_after: chrono::Duration,
    ) -> Self {
        Self { db, store, fetcher, stale_after, pass_lock: Mutex::new(()) }
    }

    pub fn stale_after(&self) -> chrono::Duration {
        self.stale_after
    }

    /// Run one pass for a document and persist the checked url.
    ///
    /// Only the checked row is written back, so a list change that lands
    /// while the fetch is in flight survives the pass. The returned outcome
    /// carries the list as stored after the pass.
    pub async fn run_document(&self, document: &str, now: DateTime<Utc>) -> Result<RefreshOutcome, Error> {
        let _guard = self.pass_lock.lock().await;

        let resources = self.db.tracked_resources(document).await?;
        let outcome = run_one_pass(&resources, self.stale_after, now, self.store.as_ref(), self.fetcher.as_ref())
            .instrument(tracing::info_span!("refresh_pass", document = %document))
            .await?;

        match outcome.url() {
            Some(url) => {
                let stored = self.db.mark_checked(document, url, now).await?;
                Ok(outcome.with_resources(stored))
            }
            None => Ok(outcome),
        }
    }

    /// Reconcile a document's tracked urls, waiting for any running pass.
    pub async fn track_document(&self, document: &str, urls: &[String]) -> Result<Vec<TrackedResource>, Error> {
        let _guard = self.pass_lock.lock().await;
        self.db.track_document(document, urls).await
    }

    /// Run one pass for every tracked document.
    ///
    /// A failing document does not stop the others; its error is returned
    /// in its [`DocumentPass`].
    pub async fn run_all(&self, now: DateTime<Utc>) -> Result<Vec<DocumentPass>, Error> {
        let documents = self.db.documents().await?;
        let mut passes = Vec::with_capacity(documents.len());

        for document in documents {
            let outcome = self.run_document(&document, now).await;
            if let Err(e) = &outcome
                && !e.is_retryable()
            {
                tracing::error!(document = %document, error = %e, "refresh pass failed");
            }
            passes.push(DocumentPass { document, outcome });
        }

        Ok(passes)
    }
}
