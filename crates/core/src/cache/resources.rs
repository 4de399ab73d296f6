//! Tracked-resource metadata.
//!
//! Each document (a page or other rendering unit) references an ordered
//! list of remote calendars. The list order is the refresh order.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Transaction, types::Type};

use super::connection::CacheDb;
use crate::Error;

/// A remote calendar referenced by a document, with its refresh bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedResource {
    pub url: String,
    /// Most recent refresh attempt that reached the remote server.
    pub last_checked_at: DateTime<Utc>,
}

impl TrackedResource {
    /// A resource that was never checked; it is stale for any threshold.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), last_checked_at: DateTime::<Utc>::UNIX_EPOCH }
    }

    pub fn checked_at(url: impl Into<String>, last_checked_at: DateTime<Utc>) -> Self {
        Self { url: url.into(), last_checked_at }
    }

    /// Whether `now - last_checked_at >= stale_after`.
    pub fn is_stale(&self, stale_after: chrono::Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_checked_at) >= stale_after
    }
}

fn require_document(document: &str) -> Result<(), Error> {
    if document.trim().is_empty() {
        return Err(Error::InvalidInput("document cannot be empty".into()));
    }
    Ok(())
}

/// Keep the first occurrence of each url.
fn dedupe(resources: &[TrackedResource]) -> Vec<TrackedResource> {
    let mut seen = HashSet::new();
    resources
        .iter()
        .filter(|r| seen.insert(r.url.as_str()))
        .cloned()
        .collect()
}

fn load(conn: &rusqlite::Connection, document: &str) -> Result<Vec<TrackedResource>, Error> {
    let mut stmt = conn.prepare(
        "SELECT url, last_checked_at FROM tracked_resources
         WHERE document = ?1 ORDER BY position",
    )?;

    let rows = stmt.query_map(params![document], |row| {
        let url: String = row.get(0)?;
        let raw: String = row.get(1)?;
        let last_checked_at = DateTime::parse_from_rfc3339(&raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?
            .with_timezone(&Utc);
        Ok(TrackedResource { url, last_checked_at })
    })?;

    rows.collect::<Result<Vec<_>, _>>().map_err(Error::from)
}

fn replace(tx: &Transaction<'_>, document: &str, resources: &[TrackedResource]) -> Result<(), Error> {
    tx.execute("DELETE FROM tracked_resources WHERE document = ?1", params![document])?;

    let mut stmt = tx.prepare(
        "INSERT INTO tracked_resources (document, url, position, last_checked_at)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, resource) in resources.iter().enumerate() {
        stmt.execute(params![
            document,
            &resource.url,
            position as i64,
            resource.last_checked_at.to_rfc3339()
        ])?;
    }

    Ok(())
}

impl CacheDb {
    /// Tracked resources of a document in refresh order.
    ///
    /// An unknown document has an empty list.
    pub async fn tracked_resources(&self, document: &str) -> Result<Vec<TrackedResource>, Error> {
        require_document(document)?;
        let document = document.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<TrackedResource>, Error> { load(conn, &document) })
            .await
            .map_err(Error::from)
    }

    /// Replace a document's tracked list, e.g. after a refresh pass.
    ///
    /// Duplicate urls keep their first occurrence.
    pub async fn save_tracked_resources(&self, document: &str, resources: &[TrackedResource]) -> Result<(), Error> {
        require_document(document)?;
        let document = document.to_string();
        let resources = dedupe(resources);
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                replace(&tx, &document, &resources)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Record a successful check of one url and move it to the back of the list.
    ///
    /// Only that row changes, so urls tracked or dropped while the fetch was
    /// in flight are kept as they are. A url no longer tracked is left alone.
    /// Returns the document's list after the update.
    pub async fn mark_checked(
        &self, document: &str, url: &str, checked_at: DateTime<Utc>,
    ) -> Result<Vec<TrackedResource>, Error> {
        require_document(document)?;
        let document = document.to_string();
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<TrackedResource>, Error> {
                let tx = conn.transaction()?;
                let updated = tx.execute(
                    "UPDATE tracked_resources
                     SET last_checked_at = ?3,
                         position = (SELECT COALESCE(MAX(position), -1) + 1
                                     FROM tracked_resources WHERE document = ?1)
                     WHERE document = ?1 AND url = ?2",
                    params![document, url, checked_at.to_rfc3339()],
                )?;
                if updated == 0 {
                    tracing::debug!(document = %document, url = %url, "checked url no longer tracked");
                }
                let resources = load(&tx, &document)?;
                tx.commit()?;
                Ok(resources)
            })
            .await
            .map_err(Error::from)
    }

    /// Reconcile a document's tracked list with the urls it currently references.
    ///
    /// Urls already tracked keep their last-checked time, new urls start out
    /// never checked, and urls no longer referenced are dropped. The result
    /// follows the order of `urls`.
    pub async fn track_document(&self, document: &str, urls: &[String]) -> Result<Vec<TrackedResource>, Error> {
        require_document(document)?;
        if let Some(blank) = urls.iter().find(|u| u.trim().is_empty()) {
            return Err(Error::InvalidUrl(format!("empty url {blank:?}")));
        }

        let document = document.to_string();
        let urls = urls.to_vec();
        self.conn
            .call(move |conn| -> Result<Vec<TrackedResource>, Error> {
                let tx = conn.transaction()?;

                let known: HashMap<String, DateTime<Utc>> = load(&tx, &document)?
                    .into_iter()
                    .map(|r| (r.url, r.last_checked_at))
                    .collect();

                let resources: Vec<TrackedResource> = urls
                    .into_iter()
                    .map(|url| match known.get(&url) {
                        Some(at) => TrackedResource::checked_at(url, *at),
                        None => TrackedResource::new(url),
                    })
                    .collect();
                let resources = dedupe(&resources);

                replace(&tx, &document, &resources)?;
                tx.commit()?;

                tracing::debug!(document = %document, tracked = resources.len(), "tracked resources reconciled");
                Ok(resources)
            })
            .await
            .map_err(Error::from)
    }

    /// Documents that track at least one url.
    pub async fn documents(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT DISTINCT document FROM tracked_resources ORDER BY document")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect::<Result<Vec<String>, _>>().map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }
}
