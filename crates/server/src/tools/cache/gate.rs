//! cache_gate tool implementation.
//!
//! Tells the host whether a rendered page embedding remote calendars may be
//! reused, and which cache files it must track as dependencies.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use icalcache_core::CacheGate;

use crate::error::ToolError;
use crate::state::AppState;

/// Parameters for the cache_gate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGateParams {
    /// Calendar urls the rendered page depends on.
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Output from the cache_gate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGateOutput {
    /// False when any calendar has no cache entry yet; the page must be
    /// rendered fresh and not stored.
    pub cacheable: bool,
    /// Cache files to add to the page's freshness dependencies.
    pub dependencies: Vec<String>,
}

/// Implementation of the cache_gate tool.
pub fn gate_impl(state: &AppState, params: CacheGateParams) -> Result<CallToolResult, McpError> {
    if let Some(index) = params.urls.iter().position(|u| u.trim().is_empty()) {
        return Err(ToolError::InvalidInput(format!("urls[{index}] is empty")).into());
    }

    let decision = CacheGate::new(state.store.as_ref()).evaluate(&params.urls);
    let output = CacheGateOutput {
        cacheable: decision.is_cacheable(),
        dependencies: decision
            .dependencies()
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
    };

    let json = serde_json::to_string_pretty(&output).map_err(ToolError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::state;
    use crate::tools::output_text;
    use icalcache_core::CacheStore;
    use icalcache_core::cache::compute_cache_key;

    fn gate(state: &AppState, urls: &[&str]) -> CacheGateOutput {
        let params = CacheGateParams { urls: urls.iter().map(|u| u.to_string()).collect() };
        let result = gate_impl(state, params).unwrap();
        serde_json::from_str(&output_text(&result)).unwrap()
    }

    #[tokio::test]
    async fn test_gate_not_cacheable_when_missing() {
        let (_dir, state) = state(&[]).await;
        let output = gate(&state, &["https://example.com/cal.ics"]);
        assert!(!output.cacheable);
        assert!(output.dependencies.is_empty());
    }

    #[tokio::test]
    async fn test_gate_cacheable_with_dependencies() {
        let (_dir, state) = state(&[]).await;
        let key = compute_cache_key("https://example.com/cal.ics");
        state.store.write(&key, b"BEGIN:VCALENDAR").await.unwrap();

        let output = gate(&state, &["https://example.com/cal.ics"]);

        assert!(output.cacheable);
        assert_eq!(output.dependencies, vec![state.store.locate(&key).display().to_string()]);
    }

    #[tokio::test]
    async fn test_gate_empty_list() {
        let (_dir, state) = state(&[]).await;
        let output = gate(&state, &[]);
        assert!(output.cacheable);
    }

    #[tokio::test]
    async fn test_gate_rejects_blank_url() {
        let (_dir, state) = state(&[]).await;
        let params = CacheGateParams { urls: vec!["".into()] };
        assert!(gate_impl(&state, params).is_err());
    }
}
