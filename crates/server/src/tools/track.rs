//! track_document tool implementation.
//!
//! Records the calendar urls a document currently embeds so refresh passes
//! know what to check.

use chrono::{DateTime, Utc};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use icalcache_client::fetch::canonicalize;
use icalcache_core::{Error, TrackedResource};

use crate::error::ToolError;
use crate::state::AppState;

/// Parameters for the track_document tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TrackDocumentParams {
    /// Identifier of the document embedding the calendars.
    pub document: String,
    /// Calendar urls in the order the document references them.
    #[serde(default)]
    pub urls: Vec<String>,
}

/// A tracked calendar as reported to callers.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TrackedResourceView {
    pub url: String,
    /// RFC 3339 time of the last successful check.
    pub last_checked_at: String,
    pub never_checked: bool,
}

impl From<&TrackedResource> for TrackedResourceView {
    fn from(resource: &TrackedResource) -> Self {
        Self {
            url: resource.url.clone(),
            last_checked_at: resource.last_checked_at.to_rfc3339(),
            never_checked: resource.last_checked_at == DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// Output from the track_document tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TrackDocumentOutput {
    pub document: String,
    pub resources: Vec<TrackedResourceView>,
}

/// Implementation of the track_document tool.
pub async fn track_impl(state: &AppState, params: TrackDocumentParams) -> Result<CallToolResult, McpError> {
    if params.document.trim().is_empty() {
        return Err(ToolError::InvalidInput("document is required".into()).into());
    }

    for url in &params.urls {
        canonicalize(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
    }

    let resources = state.worker.track_document(&params.document, &params.urls).await?;

    let output = TrackDocumentOutput {
        document: params.document,
        resources: resources.iter().map(TrackedResourceView::from).collect(),
    };

    let json = serde_json::to_string_pretty(&output).map_err(ToolError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
