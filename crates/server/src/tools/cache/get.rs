//! cache_get tool implementation.
//!
//! Returns the cached document for a calendar url without touching the
//! network.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use icalcache_core::cache::{compute_cache_key, read_cached};
use icalcache_core::{CacheStore, Error};

use crate::error::ToolError;
use crate::state::AppState;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// The calendar url, exactly as tracked.
    pub url: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub url: String,
    /// Cache file holding the document.
    pub path: String,
    /// Size of the cached document in bytes.
    pub bytes: usize,
    /// The cached document (lossy UTF-8).
    pub content: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(state: &AppState, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let content = read_cached(state.store.as_ref(), &params.url)
        .await?
        .ok_or_else(|| Error::CacheMiss(params.url.clone()))?;

    let output = CacheGetOutput {
        path: state.store.locate(&compute_cache_key(&params.url)).display().to_string(),
        bytes: content.len(),
        content: String::from_utf8_lossy(&content).into_owned(),
        url: params.url,
    };

    let json = serde_json::to_string_pretty(&output).map_err(ToolError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
