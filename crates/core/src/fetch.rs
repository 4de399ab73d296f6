//! Seam between the refresh worker and the HTTP transport.

use async_trait::async_trait;
use bytes::Bytes;

use crate::Error;

/// Fetches the current body of a remote calendar.
///
/// Implementations return `Error::FetchFailed` for transport errors and
/// non-success statuses; only a successful body is `Ok`.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get(&self, url: &str) -> Result<Bytes, Error>;
}
